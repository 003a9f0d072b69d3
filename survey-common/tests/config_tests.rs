//! Tests for configuration resolution priority
//!
//! Tests that manipulate SURVEY_CONFIG or SURVEY_DATABASE are marked with
//! #[serial] so they never run in parallel.

use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use survey_common::config::{
    default_database_path, load_toml, resolve_config_path, resolve_database_path, LoggingConfig,
    CONFIG_ENV_VAR, DATABASE_ENV_VAR,
};
use tempfile::TempDir;

#[derive(Debug, Default, Deserialize)]
struct SampleConfig {
    database_path: Option<PathBuf>,
    #[serde(default)]
    logging: LoggingConfig,
}

#[test]
#[serial]
fn test_database_path_cli_wins_over_env_and_toml() {
    env::set_var(DATABASE_ENV_VAR, "/tmp/from-env.db");

    let resolved = resolve_database_path(
        Some(Path::new("/tmp/from-cli.db")),
        Some(Path::new("/tmp/from-toml.db")),
    );
    assert_eq!(resolved, PathBuf::from("/tmp/from-cli.db"));

    env::remove_var(DATABASE_ENV_VAR);
}

#[test]
#[serial]
fn test_database_path_env_wins_over_toml() {
    env::set_var(DATABASE_ENV_VAR, "/tmp/from-env.db");

    let resolved = resolve_database_path(None, Some(Path::new("/tmp/from-toml.db")));
    assert_eq!(resolved, PathBuf::from("/tmp/from-env.db"));

    env::remove_var(DATABASE_ENV_VAR);
}

#[test]
#[serial]
fn test_database_path_falls_back_to_toml_then_default() {
    env::remove_var(DATABASE_ENV_VAR);

    let from_toml = resolve_database_path(None, Some(Path::new("/tmp/from-toml.db")));
    assert_eq!(from_toml, PathBuf::from("/tmp/from-toml.db"));

    let fallback = resolve_database_path(None, None);
    assert_eq!(fallback, default_database_path());
}

#[test]
#[serial]
fn test_config_path_from_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/survey-config.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/survey-config.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let config: SampleConfig = load_toml(Some(&missing)).unwrap();
    assert!(config.database_path.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_config_file_parsed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "database_path = \"/data/survey.db\"\n\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();

    let config: SampleConfig = load_toml(Some(&path)).unwrap();
    assert_eq!(config.database_path, Some(PathBuf::from("/data/survey.db")));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "database_path = [unterminated").unwrap();

    let result: survey_common::Result<SampleConfig> = load_toml(Some(&path));
    assert!(result.is_err());
}
