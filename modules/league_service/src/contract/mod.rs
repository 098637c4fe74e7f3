//! Contract layer - public API for in-process callers
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - these are pure domain types.

pub mod client;
pub mod error;
pub mod model;

pub use client::LeagueApi;
pub use error::LeagueError;
pub use model::*;
