//! Configuration for the league service
//!
//! Loaded once at startup from, in increasing precedence: built-in defaults,
//! an optional YAML file, and `LEAGUE_`-prefixed environment variables with
//! `__` separating nested keys (`LEAGUE_DATABASE__URL`).

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "LEAGUE_";

/// Backing store family selected for content-capable entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBackend {
    #[default]
    Content,
    Relational,
}

impl std::fmt::Display for DataBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataBackend::Content => f.write_str("content"),
            DataBackend::Relational => f.write_str("relational"),
        }
    }
}

/// League service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Store family for seasons, divisions, teams, games and players
    #[serde(default)]
    pub data_backend: DataBackend,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub content: ContentConfig,

    /// Per-call deadline for every repository call made by the service
    #[serde(default = "default_store_timeout", with = "humantime_serde")]
    pub store_timeout: Duration,

    #[serde(default)]
    pub realtime: RealtimeConfig,

    #[serde(default)]
    pub pricing: PricingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_backend: DataBackend::default(),
            database: DatabaseConfig::default(),
            content: ContentConfig::default(),
            store_timeout: default_store_timeout(),
            realtime: RealtimeConfig::default(),
            pricing: PricingConfig::default(),
        }
    }
}

/// Relational store connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Restricted (client-side) connection string
    #[serde(default)]
    pub url: Option<String>,

    /// Elevated (server-side) connection string, preferred when present
    #[serde(default)]
    pub service_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply schema migrations at startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_url: None,
            max_connections: default_max_connections(),
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    /// Connection string to use server-side: elevated first, then restricted
    pub fn connection_url(&self) -> Option<&str> {
        self.service_url
            .as_deref()
            .or(self.url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

/// Content store project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Project API root, e.g. `https://<project>.api.example.io`
    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_dataset")]
    pub dataset: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Read/write token; anonymous reads when absent
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            dataset: default_dataset(),
            api_version: default_api_version(),
            token: None,
        }
    }
}

impl ContentConfig {
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}

/// Live subscription behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealtimeConfig {
    #[serde(default = "default_initial_backoff", with = "humantime_serde")]
    pub initial_backoff: Duration,

    #[serde(default = "default_max_backoff", with = "humantime_serde")]
    pub max_backoff: Duration,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Fraction of each delay randomized, 0.0..=1.0
    #[serde(default = "default_jitter")]
    pub jitter: f64,

    /// Buffered updates per subscription
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Follow the relational store's own change notifications when it is
    /// Postgres, so writes made by other processes reach subscribers
    #[serde(default = "default_true")]
    pub store_notifications: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            initial_backoff: default_initial_backoff(),
            max_backoff: default_max_backoff(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
            channel_capacity: default_channel_capacity(),
            store_notifications: true,
        }
    }
}

/// Package prices in minor currency units
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_full_season_cents")]
    pub full_season_cents: i64,

    #[serde(default = "default_two_session_cents")]
    pub two_session_cents: i64,

    #[serde(default = "default_pay_per_session_cents")]
    pub pay_per_session_cents: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            full_season_cents: default_full_season_cents(),
            two_session_cents: default_two_session_cents(),
            pay_per_session_cents: default_pay_per_session_cents(),
        }
    }
}

impl PricingConfig {
    pub fn price_of(&self, package: crate::contract::Package) -> i64 {
        use crate::contract::Package;
        match package {
            Package::FullSeason => self.full_season_cents,
            Package::TwoSession => self.two_session_cents,
            Package::PayPerSession => self.pay_per_session_cents,
        }
    }
}

impl Config {
    /// Load configuration with the default environment prefix
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load configuration reading overrides from `env_prefix` variables
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()
            .context("invalid league service configuration")
    }
}

fn default_store_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_connections() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_dataset() -> String {
    "production".to_string()
}

fn default_api_version() -> String {
    "2021-10-21".to_string()
}

fn default_initial_backoff() -> Duration {
    Duration::from_millis(500)
}

fn default_max_backoff() -> Duration {
    Duration::from_secs(30)
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.2
}

fn default_channel_capacity() -> usize {
    64
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_full_season_cents() -> i64 {
    120_000
}

fn default_two_session_cents() -> i64 {
    70_000
}

fn default_pay_per_session_cents() -> i64 {
    40_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::load_with_prefix(None, "LEAGUE_TEST_DEFAULTS_").unwrap();
        assert_eq!(config.data_backend, DataBackend::Content);
        assert_eq!(config.store_timeout, Duration::from_secs(10));
        assert_eq!(config.content.dataset, "production");
        assert!(config.database.connection_url().is_none());
        assert_eq!(config.realtime.multiplier, 2.0);
        assert!(config.realtime.store_notifications);
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "data_backend: relational\n\
             store_timeout: 250ms\n\
             database:\n  url: postgres://anon@db/league\n  service_url: postgres://svc@db/league\n\
             realtime:\n  initial_backoff: 1s\n  store_notifications: false\n"
        )
        .unwrap();

        let config = Config::load_with_prefix(Some(file.path()), "LEAGUE_TEST_YAML_").unwrap();
        assert_eq!(config.data_backend, DataBackend::Relational);
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert_eq!(
            config.database.connection_url(),
            Some("postgres://svc@db/league")
        );
        assert_eq!(config.realtime.initial_backoff, Duration::from_secs(1));
        assert_eq!(config.realtime.max_backoff, Duration::from_secs(30));
        assert!(!config.realtime.store_notifications);
    }

    #[test]
    fn test_environment_overrides_nested_keys() {
        std::env::set_var("LEAGUE_TEST_ENV_DATA_BACKEND", "relational");
        std::env::set_var("LEAGUE_TEST_ENV_CONTENT__BASE_URL", "https://cms.example.test");

        let config = Config::load_with_prefix(None, "LEAGUE_TEST_ENV_").unwrap();
        assert_eq!(config.data_backend, DataBackend::Relational);
        assert_eq!(config.content.base_url, "https://cms.example.test");
        assert!(config.content.is_configured());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        std::env::set_var("LEAGUE_TEST_BAD_DATA_BACKEND", "spreadsheet");
        assert!(Config::load_with_prefix(None, "LEAGUE_TEST_BAD_").is_err());
    }

    #[test]
    fn test_pricing_by_package() {
        use crate::contract::Package;
        let pricing = PricingConfig::default();
        assert_eq!(pricing.price_of(Package::TwoSession), 70_000);
    }
}
