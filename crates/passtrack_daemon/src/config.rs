//! Configuration file support for the passtrack daemon.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. Environment variables (prefixed with `PASSTRACK_`, sections separated
//!    by `__`, e.g. `PASSTRACK_DATABASE__URL`, `PASSTRACK_API__CLIENT_SECRET`)
//! 2. Config file (`~/.config/passtrack/config.toml` or `./passtrack.toml`)
//! 3. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/passtrack/passtrack.db`
//! (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://passtrack.db?mode=rwc"
//!
//! [api]
//! client_id = "12345"
//! client_secret = "..."       # or PASSTRACK_API__CLIENT_SECRET
//! # base_url = "https://osu.ppy.sh"
//! # requests_per_second = 1
//!
//! [discovery]
//! # One-time backfill: sweep the entire remote catalog instead of stopping
//! # at the first known mapset. Leave off for normal operation.
//! force_full = false
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub discovery: DiscoveryConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL. Defaults to the XDG state directory.
    pub url: Option<String>,
}

/// Remote API configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// OAuth2 client id.
    pub client_id: Option<String>,
    /// OAuth2 client secret.
    pub client_secret: Option<String>,
    /// Override the remote service base URL (staging, local stubs).
    pub base_url: Option<String>,
    /// Proactive rate limit applied before every remote call.
    pub requests_per_second: Option<u32>,
}

/// Catalog discovery configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Sweep the entire remote catalog instead of stopping at the first
    /// known mapset. Intended for the initial backfill only.
    pub force_full: bool,
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(dirs) = ProjectDirs::from("", "", "passtrack") {
            let path = dirs.config_dir().join("config.toml");
            builder = builder.add_source(
                File::from(path).format(FileFormat::Toml).required(false),
            );
        }
        builder = builder
            .add_source(
                File::with_name("passtrack")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("PASSTRACK")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// The database URL, falling back to the XDG state directory.
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database.url {
            return url.clone();
        }
        let state_dir = ProjectDirs::from("", "", "passtrack")
            .map(|dirs| {
                dirs.state_dir()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| dirs.data_local_dir().to_path_buf())
            })
            .unwrap_or_else(|| PathBuf::from("."));
        format!(
            "sqlite://{}?mode=rwc",
            state_dir.join("passtrack.db").display()
        )
    }

    /// Required API credentials.
    pub fn api_credentials(&self) -> Result<(String, String), ConfigError> {
        let client_id = self
            .api
            .client_id
            .clone()
            .ok_or(ConfigError::Missing("api.client_id"))?;
        let client_secret = self
            .api
            .client_secret
            .clone()
            .ok_or(ConfigError::Missing("api.client_secret"))?;
        Ok((client_id, client_secret))
    }
}
