//! SeaORM entities for the relational store
//!
//! Relations are resolved by the repositories in batches, so entities only
//! declare their columns.

pub mod conference;
pub mod division;
pub mod enrollment;
pub mod game;
pub mod game_event;
pub mod game_official;
pub mod official;
pub mod player;
pub mod registration;
pub mod roster;
pub mod roster_player;
pub mod season;
pub mod season_division;
pub mod session;
pub mod team;
pub mod team_payment;
pub mod venue;
