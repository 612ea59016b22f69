//! Configuration file support for feeder.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `FEEDER_`, sections split by `__`,
//!    e.g. `FEEDER_DESTINATION__TOKEN`, `FEEDER_FEED__WORKERS`)
//! 3. Config file (./feeder.toml, then ~/.config/feeder/config.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/feeder/feeder.db` on Linux
//! (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite:///var/lib/feeder/feeder.db?mode=rwc"
//!
//! [source]
//! host = "github.com"
//!
//! [destination]
//! api_url = "https://ghe.example.com/api/v3"
//! host = "ghe.example.com"
//! token = "..."  # or use FEEDER_DESTINATION__TOKEN
//! admin = "site-admin"
//!
//! [feed]
//! workers = 20
//! clone_concurrency = 10
//! push_concurrency = 10
//! api_rps = 10
//! clone_timeout_secs = 1800
//! push_attempts = 3
//! push_retry_delay_ms = 1000
//! org_min_capacity = 5
//! org_max_capacity = 500
//! resume = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use feeder::feed::{
    DEFAULT_CLONE_CONCURRENCY, DEFAULT_CLONE_TIMEOUT_SECS, DEFAULT_PUSH_CONCURRENCY,
    DEFAULT_WORKERS, Destination, FeedOptions,
};
use feeder::org::{DEFAULT_MAX_ORG_CAPACITY, DEFAULT_MIN_ORG_CAPACITY};
use feeder::rate_limits;
use feeder::retry::{DEFAULT_PUSH_ATTEMPTS, DEFAULT_RETRY_MAX_DELAY_MS, DEFAULT_RETRY_MIN_DELAY_MS};
use feeder::RetryConfig;
use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Where repositories are cloned from.
    pub source: SourceConfig,
    /// The GitHub Enterprise instance repositories are pushed to.
    pub destination: DestinationConfig,
    /// Pipeline tuning.
    pub feed: FeedConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// Source host configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Host name (`github.com`) or base URL (`https://github.com`).
    pub host: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: "github.com".to_string(),
        }
    }
}

/// Destination configuration.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// REST API root, e.g. `https://ghe.example.com/api/v3`.
    /// Derived from `host` when unset.
    pub api_url: Option<String>,
    /// Host name used in push URLs.
    pub host: Option<String>,
    /// Access token. Must be allowed to create organizations.
    pub token: Option<String>,
    /// Account made owner of created organizations.
    pub admin: Option<String>,
}

impl std::fmt::Debug for DestinationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationConfig")
            .field("api_url", &self.api_url)
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("admin", &self.admin)
            .finish()
    }
}

/// Pipeline options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub workers: usize,
    pub clone_concurrency: usize,
    pub push_concurrency: usize,
    pub api_rps: u32,
    pub clone_timeout_secs: u64,
    pub push_attempts: usize,
    pub push_retry_delay_ms: u64,
    /// Scratch root; defaults to `$TMPDIR/feeder`.
    pub scratch_dir: Option<PathBuf>,
    pub org_min_capacity: usize,
    pub org_max_capacity: usize,
    pub resume: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            clone_concurrency: DEFAULT_CLONE_CONCURRENCY,
            push_concurrency: DEFAULT_PUSH_CONCURRENCY,
            api_rps: rate_limits::GHE_DEFAULT_RPS,
            clone_timeout_secs: DEFAULT_CLONE_TIMEOUT_SECS,
            push_attempts: DEFAULT_PUSH_ATTEMPTS,
            push_retry_delay_ms: DEFAULT_RETRY_MIN_DELAY_MS,
            scratch_dir: None,
            org_min_capacity: DEFAULT_MIN_ORG_CAPACITY,
            org_max_capacity: DEFAULT_MAX_ORG_CAPACITY,
            resume: true,
        }
    }
}

/// Error for settings a run cannot start without.
#[derive(Debug, Error)]
#[error("Missing setting `{0}` (set it in feeder.toml or via {env})", env = env_var_name(.0))]
pub struct MissingSetting(&'static str);

/// Environment variable that sets a dotted config key.
fn env_var_name(key: &str) -> String {
    format!("FEEDER_{}", key.to_uppercase().replace('.', "__"))
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/feeder/config.toml)
    /// 3. Local config file (./feeder.toml)
    /// 4. Environment variables with FEEDER_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("feeder.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./feeder.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // FEEDER_FEED__CLONE_CONCURRENCY -> feed.clone_concurrency
        builder = builder.add_source(
            Environment::with_prefix("FEEDER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("feeder.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Base URL repositories are cloned from.
    pub fn source_base(&self) -> String {
        let host = self.source.host.trim_end_matches('/');
        if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }

    /// Destination API root; defaults to `https://{host}/api/v3`.
    pub fn destination_api_url(&self) -> Result<String, MissingSetting> {
        if let Some(url) = &self.destination.api_url {
            return Ok(url.clone());
        }
        let host = self
            .destination
            .host
            .as_deref()
            .ok_or(MissingSetting("destination.host"))?;
        Ok(format!("https://{host}/api/v3"))
    }

    /// Destination host and credentials, all required for a run.
    pub fn destination(&self) -> Result<Destination, MissingSetting> {
        let required = |value: &Option<String>, name| value.clone().ok_or(MissingSetting(name));
        Ok(Destination {
            host: required(&self.destination.host, "destination.host")?,
            token: required(&self.destination.token, "destination.token")?,
            admin: required(&self.destination.admin, "destination.admin")?,
        })
    }

    /// Feed options from configuration, before CLI overrides.
    pub fn feed_options(&self) -> Result<FeedOptions, MissingSetting> {
        let feed = &self.feed;
        let defaults = FeedOptions::default();
        Ok(FeedOptions {
            workers: feed.workers,
            clone_concurrency: feed.clone_concurrency,
            push_concurrency: feed.push_concurrency,
            api_rps: feed.api_rps,
            clone_timeout: Duration::from_secs(feed.clone_timeout_secs),
            push_retry: RetryConfig::new(
                Duration::from_millis(feed.push_retry_delay_ms),
                Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS.max(feed.push_retry_delay_ms)),
                feed.push_attempts,
            ),
            scratch_dir: feed.scratch_dir.clone().unwrap_or(defaults.scratch_dir),
            source_base: self.source_base(),
            destination: self.destination()?,
            org_min_capacity: feed.org_min_capacity,
            org_max_capacity: feed.org_max_capacity,
            resume: feed.resume,
            ..defaults
        })
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "feeder").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/feeder` or `~/.local/state/feeder`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "feeder").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
