//! Contract error types for the league service
//!
//! These errors are transport-agnostic. Route handlers translate them with
//! [`LeagueError::http_status`].

use http::StatusCode;
use std::time::Duration;

/// League service domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeagueError {
    /// Entity not found where one was required
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource type (registration, game, ...)
        resource: String,
        /// Resource identifier
        id: String,
    },

    /// Input rejected before any persistence
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Registration status change outside the transition table
    #[error("Invalid status transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    /// Concurrent modification detected by a conditional write
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    /// Backing store or transport failure
    #[error("Store error: {message}")]
    Store { message: String },

    /// Store call exceeded the configured timeout
    #[error("Store call '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },
}

impl LeagueError {
    pub fn not_found(resource: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP status a route handler should answer with
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation { .. } | Self::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Whether a client may retry the same call unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store { .. } | Self::Timeout { .. } | Self::Conflict { .. }
        )
    }
}
