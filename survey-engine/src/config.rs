//! Bootstrap configuration for survey-engine
//!
//! Loaded once from TOML at startup; every field has a built-in default so a
//! missing file still yields a runnable service.

use serde::Deserialize;
use std::path::PathBuf;
use survey_common::config::LoggingConfig;
use survey_common::{Error, Result};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file (relative or absolute)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Interface the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Business rules applied to bulk ingestion
    #[serde(default)]
    pub ingestion: IngestionPolicy,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            bind_address: default_bind_address(),
            port: default_port(),
            logging: LoggingConfig::default(),
            ingestion: IngestionPolicy::default(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

/// How a unit's reconciliation writes reach the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitWriteMode {
    /// All writes of a unit commit together or not at all
    #[default]
    Transactional,
    /// Each write commits as it happens; a late failure leaves earlier writes
    Immediate,
}

/// Structural rules every ingestion unit must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IngestionPolicy {
    /// Surveys required per campaign
    pub survey_count: usize,
    /// Questions required per survey
    pub questions_per_survey: usize,
    /// Options required on single- and multi-select questions
    pub choice_option_count: usize,
    /// Channel every ingested survey must declare
    pub channel: String,
    /// Question type name expected at each position (index 0 = order 1)
    pub expected_types: Vec<String>,
    pub unit_write_mode: UnitWriteMode,
}

impl Default for IngestionPolicy {
    fn default() -> Self {
        Self {
            survey_count: 3,
            questions_per_survey: 5,
            choice_option_count: 3,
            channel: "Ocr".to_string(),
            expected_types: vec![
                "Opción Múltiple".to_string(),
                "Completar".to_string(),
                "Opción Única".to_string(),
                "Completar".to_string(),
                "Completar".to_string(),
            ],
            unit_write_mode: UnitWriteMode::Transactional,
        }
    }
}

impl IngestionPolicy {
    /// Reject a policy whose type pattern does not cover every question position
    ///
    /// An empty `expected_types` disables the pattern rule.
    pub fn check(&self) -> Result<()> {
        if !self.expected_types.is_empty() && self.expected_types.len() != self.questions_per_survey {
            return Err(Error::Config(format!(
                "ingestion.expected_types lists {} types but questions_per_survey is {}",
                self.expected_types.len(),
                self.questions_per_survey
            )));
        }
        Ok(())
    }
}
