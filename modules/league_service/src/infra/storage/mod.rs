//! Relational store - SeaORM entities, migrations and repositories

pub mod entity;
pub mod loader;
pub mod mapper;
pub mod migrations;
pub mod repositories;
