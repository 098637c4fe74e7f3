//! Content store - HTTP client, document shapes, queries and repositories

pub mod client;
pub mod documents;
pub mod queries;
pub mod repositories;
pub mod transform;

pub use client::{ContentClient, HttpContentClient};
pub use repositories::{
    ContentDivisionRepository, ContentGameRepository, ContentPlayerRepository,
    ContentSeasonRepository, ContentTeamRepository,
};
