//! # configs
//!
//! Client configuration for Rusty-Bazaar, layered as: built-in defaults,
//! then an optional `bazaar.toml`, then `BAZAAR_*` environment variables.
//! A `.env` file in the working directory is loaded into the environment
//! first.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "BAZAAR";
pub const DEFAULT_FILE: &str = "bazaar.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration could not be read: {0}")]
    Source(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend including the API prefix.
    pub api_root: String,
    /// JSON file holding the persisted session.
    pub storage_path: String,
    /// Quiet period before the search box re-queries. Zero disables it.
    pub search_debounce_ms: u64,
    /// Per-request timeout. Unset means requests may wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    pub log_format: LogFormat,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_level: String,
    /// Credential to seed the session with, for scripted use.
    #[serde(default)]
    pub access_token: Option<SecretString>,
}

impl ClientConfig {
    /// Loads `.env`, then the layered sources with `bazaar.toml` in the
    /// working directory.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, ".env not loaded");
            }
        }
        Self::load_from(Some(Path::new(DEFAULT_FILE)), ENV_PREFIX)
    }

    /// Loads from an explicit file (optional on disk) and env prefix.
    pub fn load_from(file: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api_root", "http://127.0.0.1:5000/api")?
            .set_default("storage_path", ".bazaar/session.json")?
            .set_default("search_debounce_ms", 300)?
            .set_default("log_format", "plain")?
            .set_default("log_level", "info")?;
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(false));
        }
        let config: ClientConfig = builder
            .add_source(Environment::with_prefix(env_prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_root.starts_with("http://") || self.api_root.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_root must be an http(s) URL, got `{}`",
                self.api_root
            )));
        }
        if self.storage_path.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_path is empty".into()));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
