//! Persistence primitives
//!
//! Write functions take `&mut SqliteConnection` so callers decide whether a
//! sequence of writes runs inside a transaction or commits immediately.

pub mod analytics;
pub mod campaigns;
pub mod catalog;
pub mod deliveries;
pub mod questions;
pub mod recipients;
pub mod responses;
pub mod surveys;

/// Result of an upsert by natural key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub id: String,
    /// True when the row did not exist before the call
    pub created: bool,
}

impl Upserted {
    /// `candidate_id` is the id offered to the INSERT; a different returned id
    /// means the natural key already existed
    pub(crate) fn from_returned(candidate_id: String, returned_id: String) -> Self {
        Self {
            created: returned_id == candidate_id,
            id: returned_id,
        }
    }
}

/// `?, ?, ?` for a dynamic `IN (...)` list
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_upserted_detects_existing_row() {
        let created = Upserted::from_returned("a".into(), "a".into());
        assert!(created.created);

        let existing = Upserted::from_returned("a".into(), "b".into());
        assert!(!existing.created);
        assert_eq!(existing.id, "b");
    }
}
