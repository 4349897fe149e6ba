//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::fetch::FetcherConfig;

/// Environment variable that overrides `refresh.key_sha256`.
pub const REFRESH_KEY_ENV: &str = "FLOOR_STATS_REFRESH_KEY_SHA256";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Upstream replay feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// GitHub API root
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_gist_id")]
    pub gist_id: String,

    /// File inside the gist that holds the replays
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Largest snapshot accepted, in bytes
    #[serde(default = "default_max_content_size")]
    pub max_content_size: usize,
}

fn default_api_base() -> String {
    "https://api.github.com/".to_string()
}

fn default_gist_id() -> String {
    "3c6a1d310025803d5ccdc2786e60ede8".to_string()
}

fn default_file_name() -> String {
    "GGST_replays.csv".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_content_size() -> usize {
    200 * 1024 * 1024
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            gist_id: default_gist_id(),
            file_name: default_file_name(),
            timeout_seconds: default_timeout(),
            max_content_size: default_max_content_size(),
        }
    }
}

impl SourceConfig {
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            api_base: self.api_base.clone(),
            gist_id: self.gist_id.clone(),
            file_name: self.file_name.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
            max_content_size: self.max_content_size,
            ..FetcherConfig::default()
        }
    }
}

/// Refresh trigger configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Hex SHA-256 of the shared refresh secret. Empty disables the trigger.
    #[serde(default)]
    pub key_sha256: String,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            source: SourceConfig::default(),
            refresh: RefreshConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise defaults, then apply the
    /// environment override for the refresh key.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        if let Ok(key) = std::env::var(REFRESH_KEY_ENV) {
            config.refresh.key_sha256 = key.trim().to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Source timeout must be greater than 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        let key = &self.refresh.key_sha256;
        if !key.is_empty() && (key.len() != 64 || hex::decode(key).is_err()) {
            return Err(ConfigError::ValidationError(
                "refresh.key_sha256 must be 64 hex characters".to_string(),
            ));
        }

        Ok(())
    }
}
