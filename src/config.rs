use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::api::OmdbConfig;
use crate::site::SiteConfig;
use crate::storage::StorageKind;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MOVIES_CONFIG";

/// Prefix for per-key environment overrides, e.g. `MOVIES_STORAGE__BACKEND=csv`.
pub const ENV_PREFIX: &str = "MOVIES_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub omdb: OmdbConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageKind,
    /// Catalog file; defaults to `data/movies.<backend>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| self.backend.default_path())
    }
}

/// Pick the config file: `$MOVIES_CONFIG`, then `./movies.toml`, then the
/// per-user config directory.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    let local = PathBuf::from("movies.toml");
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("movie-catalog").join("config.toml"))
        .unwrap_or(local)
}

/// Load configuration from file with environment variable overrides.
/// A missing file just means defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    Figment::new()
        .merge(Toml::string(toml_str))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config
        .storage
        .path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "storage.path cannot be empty".to_string(),
        ));
    }
    if config.omdb.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "omdb.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.site.output.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "site.output cannot be empty".to_string(),
        ));
    }
    Ok(())
}
