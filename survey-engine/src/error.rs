//! Error types for the HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use survey_common::Error as CommonError;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing caller identity (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Error raised by the survey core
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Common(err) => {
                let (status, code) = match &err {
                    CommonError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    CommonError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                    CommonError::Integrity(_) => (StatusCode::CONFLICT, "INTEGRITY_ERROR"),
                    CommonError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                    CommonError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
                    CommonError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
                    CommonError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
                    CommonError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
                };
                (status, code, err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
