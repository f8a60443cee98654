//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations. Validation
//! and not-found failures are surfaced to the immediate caller; an update
//! that matches nothing because of a concurrent change is NOT an error and
//! is reported through the operation's return value instead.

use crate::db::StoreError;
use crate::models::ValidationError;
use serde_json::Value;
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Required input missing or malformed
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist
    ///
    /// `cause` carries the selector of the failed lookup, e.g. `{"_id": "..."}`.
    #[error("{message}")]
    RecordNotFound { message: String, cause: Value },

    /// The parent relation would contain (or already contains) a cycle
    #[error("Circular reference detected: {context}")]
    CircularReference { context: String },

    /// Operation exposed remotely but not implemented
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// Storage operation failed
    #[error("Storage operation failed: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Create a record not found error carrying the failed selector
    pub fn record_not_found(message: impl Into<String>, cause: Value) -> Self {
        Self::RecordNotFound {
            message: message.into(),
            cause,
        }
    }

    /// Create a circular reference error
    pub fn circular_reference(context: impl Into<String>) -> Self {
        Self::CircularReference {
            context: context.into(),
        }
    }
}
