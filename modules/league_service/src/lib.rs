//! League Service
//!
//! Core of a youth basketball league platform: seasons, divisions, teams,
//! games and player stats served from either a content store or a relational
//! store, plus team registrations, payments, standings and live game updates.

// Public exports
pub mod contract;
pub use contract::{client::LeagueApi, error::LeagueError};

pub mod module;
pub use module::LeagueModule;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
