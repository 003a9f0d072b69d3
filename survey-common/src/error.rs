//! Common error types for the survey services

use thiserror::Error;

/// Common result type for survey operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the survey crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error, including missing
    /// reference data (channels, question types)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Referenced id does not resolve under the caller's owner scope
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Write would break a referential or lifecycle invariant
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the underlying database error is a UNIQUE constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}
