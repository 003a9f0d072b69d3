//! Caller identity
//!
//! Token validation happens upstream; the engine only needs the opaque owner
//! id, passed in the `x-owner-id` header.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const OWNER_HEADER: &str = "x-owner-id";

/// Owner id of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {} header", OWNER_HEADER)))?;

        let owner = value
            .to_str()
            .map_err(|_| ApiError::Unauthorized(format!("Malformed {} header", OWNER_HEADER)))?
            .trim();

        if owner.is_empty() {
            return Err(ApiError::Unauthorized(format!("Empty {} header", OWNER_HEADER)));
        }

        Ok(OwnerId(owner.to_string()))
    }
}
