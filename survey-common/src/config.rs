//! Configuration loading and path resolution
//!
//! Every bootstrap value is resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing config file is never fatal; callers fall back to defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the bootstrap TOML file
pub const CONFIG_ENV_VAR: &str = "SURVEY_CONFIG";

/// Environment variable naming the SQLite database file
pub const DATABASE_ENV_VAR: &str = "SURVEY_DATABASE";

const APP_DIR: &str = "survey";
const DATABASE_FILE: &str = "survey.db";

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locate the bootstrap TOML file
///
/// Returns `None` when neither the CLI nor the environment name a file and no
/// file exists at the platform location.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    platform_config_file().filter(|p| p.exists())
}

/// Parse a TOML file into `T`
///
/// A `None` path or a file that does not exist yields `T::default()` with a
/// warning. A file that exists but does not parse is an error.
pub fn load_toml<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        info!("No config file found, using built-in defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using built-in defaults", path.display());
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)?;
    let parsed = toml::from_str::<T>(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(parsed)
}

/// Resolve the database file path
///
/// `toml_value` is the `database_path` key of an already loaded config file.
pub fn resolve_database_path(cli_arg: Option<&Path>, toml_value: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    default_database_path()
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./survey_data"))
        .join(DATABASE_FILE)
}

fn platform_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults_to_info() {
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_default_database_path_ends_with_file_name() {
        let path = default_database_path();
        assert!(path.ends_with(DATABASE_FILE));
    }
}
