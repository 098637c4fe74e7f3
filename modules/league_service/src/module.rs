//! Module assembly and lifecycle

use crate::api::native::NativeClient;
use crate::config::{Config, DataBackend};
use crate::contract::LeagueApi;
use crate::domain::realtime::{LiveUpdates, ReconnectPolicy};
use crate::domain::events::{ChangePublisher, NoOpChangePublisher};
use crate::domain::{ChangeFeed, Repositories, Service, Stores};
use crate::infra::change_feed::{LocalChangeFeed, StoreChangeFeed};
use crate::infra::content::{ContentClient, HttpContentClient};
use crate::infra::storage::migrations::Migrator;
use anyhow::{Context, Result};
use parking_lot::RwLock;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

/// League service module
///
/// Owns the connected stores, the repository container built from them and
/// the lazily created service and live update hub. All of them are created
/// once and shared for the lifetime of the module.
pub struct LeagueModule {
    config: Config,
    repositories: Repositories,
    feed: Arc<dyn ChangeFeed>,
    service: RwLock<Option<Arc<Service>>>,
    live: RwLock<Option<LiveUpdates>>,
}

impl LeagueModule {
    /// Connect the configured stores and build the repository container
    pub async fn init(config: Config) -> Result<Self> {
        let relational = match config.database.connection_url() {
            Some(url) => Some(Arc::new(connect(url, &config).await?)),
            None => None,
        };

        let content: Option<Arc<dyn ContentClient>> = if config.content.is_configured() {
            Some(Arc::new(HttpContentClient::new(&config.content)?))
        } else {
            None
        };

        let (feed, publisher) = change_feed(&config, relational.as_deref());
        let stores = Stores {
            relational,
            content,
            publisher,
        };

        let module = Self::from_stores(config, &stores, feed)?;
        tracing::info!(
            backend = %module.repositories.backend,
            "League service initialized"
        );
        Ok(module)
    }

    /// Build the module over already connected stores
    ///
    /// `feed` must observe the game writes made through `stores`: either the
    /// subscribing side of `stores.publisher` or a feed following the store.
    pub fn from_stores(config: Config, stores: &Stores, feed: Arc<dyn ChangeFeed>) -> Result<Self> {
        let repositories = Repositories::build(config.data_backend, stores)?;
        Ok(Self {
            config,
            repositories,
            feed,
            service: RwLock::new(None),
            live: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The repository container built at startup
    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    /// Shared domain service, created on first use
    pub fn service(&self) -> Arc<Service> {
        if let Some(service) = self.service.read().as_ref() {
            return service.clone();
        }

        let mut slot = self.service.write();
        slot.get_or_insert_with(|| {
            Arc::new(Service::new(
                self.repositories.clone(),
                self.config.store_timeout,
                self.config.pricing.clone(),
            ))
        })
        .clone()
    }

    /// In-process client over the shared service
    pub fn client(&self) -> Arc<dyn LeagueApi> {
        Arc::new(NativeClient::new(self.service()))
    }

    /// Shared live update hub, created on first use
    pub fn live_updates(&self) -> LiveUpdates {
        if let Some(live) = self.live.read().as_ref() {
            return live.clone();
        }

        let mut slot = self.live.write();
        slot.get_or_insert_with(|| {
            LiveUpdates::new(
                self.repositories.games.clone(),
                self.feed.clone(),
                ReconnectPolicy::from_config(&self.config.realtime),
                self.config.realtime.channel_capacity,
            )
        })
        .clone()
    }
}

/// Pick the change feed for the configured game store.
///
/// Games in a Postgres store are followed through the store's own
/// notifications, which cover every writing process; repositories then have
/// nothing to publish. Otherwise repositories publish into an in-process feed.
fn change_feed(
    config: &Config,
    relational: Option<&DatabaseConnection>,
) -> (Arc<dyn ChangeFeed>, Arc<dyn ChangePublisher>) {
    match relational {
        Some(db)
            if config.data_backend == DataBackend::Relational
                && config.realtime.store_notifications
                && db.get_database_backend() == DbBackend::Postgres =>
        {
            tracing::info!("realtime updates follow store notifications");
            let feed: Arc<dyn ChangeFeed> = Arc::new(StoreChangeFeed::new(
                db.get_postgres_connection_pool().clone(),
                config.realtime.channel_capacity,
            ));
            let publisher: Arc<dyn ChangePublisher> = Arc::new(NoOpChangePublisher);
            (feed, publisher)
        }
        _ => {
            let feed = Arc::new(LocalChangeFeed::default());
            (feed.clone() as Arc<dyn ChangeFeed>, feed as Arc<dyn ChangePublisher>)
        }
    }
}

async fn connect(url: &str, config: &Config) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_string());
    options
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.store_timeout)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .context("failed to connect to the relational store")?;

    if config.database.run_migrations {
        Migrator::up(&db, None)
            .await
            .context("failed to run league migrations")?;
        tracing::info!("League service migrations completed");
    }
    Ok(db)
}
