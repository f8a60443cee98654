//! Storage Error Types
//!
//! Errors raised by collection implementations. A selector that matches
//! nothing is not an error: updates and removals report it as a zero count.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Insert with an id that is already taken
    #[error("Document '{id}' already exists in collection '{collection}'")]
    DuplicateId { collection: String, id: String },

    /// Failed to open the database file
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to create the directory holding the database file
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// Collection names become table names, so they are restricted
    #[error("Invalid collection name: '{0}'")]
    InvalidCollectionName(String),

    /// A stored row does not hold a valid document, or a document failed to serialize
    #[error("Invalid document in collection '{collection}': {source}")]
    InvalidDocument {
        collection: String,
        source: serde_json::Error,
    },

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },
}

impl StoreError {
    pub fn duplicate_id(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    pub fn invalid_document(collection: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidDocument {
            collection: collection.into(),
            source,
        }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }
}
