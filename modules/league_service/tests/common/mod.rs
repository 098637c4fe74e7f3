//! Common test utilities: relational stores and a seeded league

#![allow(dead_code)]

use chrono::NaiveDate;
use league_service::config::{Config, DataBackend};
use league_service::contract::*;
use league_service::domain::{ChangeFeed, Stores};
use league_service::infra::change_feed::LocalChangeFeed;
use league_service::infra::storage::entity::{season_division, venue};
use league_service::infra::storage::migrations::Migrator;
use league_service::LeagueModule;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tempfile::TempDir;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("league_service=debug")
        .with_test_writer()
        .try_init();
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fresh migrated in-memory database; one connection so every query sees the same data
pub async fn setup_db() -> Arc<DatabaseConnection> {
    init_tracing();
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Arc::new(db)
}

/// Migrated database in a temporary file behind a pool of `connections`, so
/// concurrent writers reach the store on separate connections. The returned
/// directory owns the file and must outlive the connection.
pub async fn setup_file_db(connections: u32) -> (Arc<DatabaseConnection>, TempDir) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("league.db").display());
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(connections)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    (Arc::new(db), dir)
}

pub fn relational_config() -> Config {
    Config {
        data_backend: DataBackend::Relational,
        ..Config::default()
    }
}

/// Module over a fresh relational store with the local change feed
pub async fn relational_module() -> (LeagueModule, Arc<DatabaseConnection>, Arc<LocalChangeFeed>) {
    module_over(setup_db().await)
}

/// Module over a file-backed store with a pool of `connections`
pub async fn shared_module(connections: u32) -> (LeagueModule, Arc<DatabaseConnection>, TempDir) {
    let (db, dir) = setup_file_db(connections).await;
    let (module, db, _feed) = module_over(db);
    (module, db, dir)
}

fn module_over(
    db: Arc<DatabaseConnection>,
) -> (LeagueModule, Arc<DatabaseConnection>, Arc<LocalChangeFeed>) {
    let feed = Arc::new(LocalChangeFeed::new(64));
    let stores = Stores {
        relational: Some(db.clone()),
        content: None,
        publisher: feed.clone(),
    };
    let module = LeagueModule::from_stores(
        relational_config(),
        &stores,
        feed.clone() as Arc<dyn ChangeFeed>,
    )
    .unwrap();
    (module, db, feed)
}

/// Active season with one division offered, four sessions and a venue
pub struct League {
    pub season: Season,
    pub division: Division,
    pub sessions: Vec<Session>,
    pub venue_id: String,
}

pub async fn seed_league(module: &LeagueModule, db: &DatabaseConnection) -> League {
    let service = module.service();

    let season = service
        .create_season(NewSeason {
            name: "Fall 2025".to_string(),
            year: 2025,
            status: SeasonStatus::Active,
            is_active: true,
            start_date: Some(date(2025, 9, 1)),
            end_date: Some(date(2025, 12, 15)),
        })
        .await
        .unwrap();

    let division = service
        .create_division(NewDivision {
            name: "Premier 14U".to_string(),
            age_group: AgeGroup::Premier,
            conference_id: None,
        })
        .await
        .unwrap();
    offer_division(db, &season.id, &division.id).await;

    let mut sessions = Vec::new();
    for sequence in 1..=4 {
        sessions.push(
            service
                .create_session(NewSession {
                    season_id: season.id.clone(),
                    name: format!("Session {sequence}"),
                    sequence,
                    start_date: None,
                    end_date: None,
                })
                .await
                .unwrap(),
        );
    }

    let venue_id = "venue-1".to_string();
    venue::ActiveModel {
        id: Set(venue_id.clone()),
        name: Set("Riverside Gym".to_string()),
        address: Set(Some("12 River Rd".to_string())),
        city: Set(Some("Springfield".to_string())),
    }
    .insert(db)
    .await
    .unwrap();

    League {
        season,
        division,
        sessions,
        venue_id,
    }
}

/// Link a division to a season so rosters can register against it
pub async fn offer_division(db: &DatabaseConnection, season_id: &str, division_id: &str) {
    season_division::ActiveModel {
        id: Set(format!("{season_id}:{division_id}")),
        season_id: Set(season_id.to_string()),
        division_id: Set(division_id.to_string()),
    }
    .insert(db)
    .await
    .unwrap();
}

/// Team with a roster in the seeded season and division
pub async fn team_with_roster(module: &LeagueModule, league: &League, name: &str) -> (Team, Roster) {
    let service = module.service();
    let team = service
        .create_team(NewTeam {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let roster = service
        .repositories()
        .rosters
        .create(&team.id, &league.season.id, &league.division.id)
        .await
        .unwrap();
    (team, roster)
}

pub fn registration_request(package: &str, sessions: &[&Session]) -> RegistrationRequest {
    RegistrationRequest {
        user_id: "user-1".to_string(),
        team_name: "Lakeside Lions".to_string(),
        city: "Springfield".to_string(),
        contact_name: "Jordan Reyes".to_string(),
        contact_email: "jordan@example.com".to_string(),
        contact_phone: None,
        division_preference: "premier-14u".to_string(),
        selected_package: package.to_string(),
        selected_session_ids: sessions.iter().map(|s| s.id.clone()).collect(),
        notes: None,
    }
}
