//! Common shape shared by every stored record.

use chrono::{DateTime, Utc};

/// Fields every collection document carries.
///
/// - `id`: server-assigned identifier, immutable once set
/// - `created_at`: set once when the record is created
/// - `modified_at`: refreshed by every mutating write
pub trait CollectionItem {
    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    fn modified_at(&self) -> DateTime<Utc>;
}

/// Matcher for id-like string fields (`_id`, `parentTagId`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdMatch {
    /// Field equals the value
    Eq(String),
    /// Field differs from the value
    Ne(String),
    /// Field equals one of the values
    In(Vec<String>),
}

impl IdMatch {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            IdMatch::Eq(expected) => value == expected,
            IdMatch::Ne(excluded) => value != excluded,
            IdMatch::In(candidates) => candidates.iter().any(|c| c == value),
        }
    }

    /// The value an `Eq` match pins
    pub fn exact(&self) -> Option<&str> {
        match self {
            IdMatch::Eq(expected) => Some(expected),
            _ => None,
        }
    }
}
