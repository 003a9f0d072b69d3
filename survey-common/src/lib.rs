//! # Survey Common Library
//!
//! Shared code for the survey services:
//! - Entity models (campaign, survey, question, option, recipient, delivery, response)
//! - Database initialization and reference data
//! - Configuration resolution
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod ids;

pub use error::{Error, Result};
