//! Identifier utilities
//!
//! Entity ids are opaque strings. Generated ids are UUIDv4 in hyphenated form.

use uuid::Uuid;

/// Generate a new entity id
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}
