//! Registration input validation and the registration status table

use crate::contract::{
    LeagueError, NewTeamRegistration, Package, PaymentStatus, RegistrationRequest,
    RegistrationStatus,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(EMAIL_PATTERN).ok());
    EMAIL.as_ref()
}

fn required(value: &str, field: &str) -> Result<(), LeagueError> {
    if value.trim().is_empty() {
        return Err(LeagueError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Simple shape check, not deliverability
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(email.trim()))
}

/// Check a registration request and turn it into a pending registration.
///
/// Session existence is checked by the service since it needs the store.
pub fn validate_registration(
    request: &RegistrationRequest,
) -> Result<NewTeamRegistration, LeagueError> {
    required(&request.team_name, "team name")?;
    required(&request.city, "city")?;
    required(&request.contact_name, "contact name")?;
    required(&request.contact_email, "contact email")?;
    if !is_valid_email(&request.contact_email) {
        return Err(LeagueError::validation(format!(
            "'{}' is not a valid email address",
            request.contact_email
        )));
    }
    required(&request.division_preference, "division preference")?;
    required(&request.selected_package, "selected package")?;

    let package = Package::parse(request.selected_package.trim()).ok_or_else(|| {
        LeagueError::validation(format!(
            "unknown package '{}'",
            request.selected_package
        ))
    })?;
    validate_sessions(package, &request.selected_session_ids)?;

    Ok(NewTeamRegistration {
        user_id: request.user_id.clone(),
        team_name: request.team_name.trim().to_string(),
        city: request.city.trim().to_string(),
        contact_name: request.contact_name.trim().to_string(),
        contact_email: request.contact_email.trim().to_string(),
        contact_phone: request.contact_phone.clone().filter(|p| !p.trim().is_empty()),
        division_preference: request.division_preference.trim().to_string(),
        selected_package: package,
        selected_session_ids: request.selected_session_ids.clone(),
        status: RegistrationStatus::Pending,
        payment_status: PaymentStatus::Pending,
        notes: request.notes.clone(),
    })
}

/// Session selection rules per package
pub fn validate_sessions(package: Package, session_ids: &[String]) -> Result<(), LeagueError> {
    match package {
        Package::FullSeason if !session_ids.is_empty() => {
            return Err(LeagueError::validation(
                "full-season package covers every session; do not select sessions",
            ));
        }
        Package::TwoSession if session_ids.len() != 2 => {
            return Err(LeagueError::validation(
                "two-session package requires exactly 2 sessions",
            ));
        }
        Package::PayPerSession if session_ids.len() != 1 => {
            return Err(LeagueError::validation(
                "pay-per-session package requires exactly 1 session",
            ));
        }
        _ => {}
    }

    let mut seen = HashSet::new();
    for id in session_ids {
        if id.trim().is_empty() {
            return Err(LeagueError::validation("session id cannot be empty"));
        }
        if !seen.insert(id.as_str()) {
            return Err(LeagueError::validation(format!(
                "session '{id}' selected more than once"
            )));
        }
    }
    Ok(())
}

/// Registration status transition table
pub fn can_transition(from: RegistrationStatus, to: RegistrationStatus) -> bool {
    use RegistrationStatus::*;
    matches!(
        (from, to),
        (Pending, Approved)
            | (Pending, Rejected)
            | (Pending, Cancelled)
            | (Approved, Cancelled)
            | (Rejected, Pending)
    )
}

pub fn check_transition(
    from: RegistrationStatus,
    to: RegistrationStatus,
) -> Result<(), LeagueError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(LeagueError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
