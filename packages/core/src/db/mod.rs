//! Database Layer
//!
//! This module handles all document storage:
//!
//! - The `Collection` trait (insert/find/update/remove/count + change feed)
//! - `LibsqlCollection`, the durable implementation: one table per
//!   collection in an embedded libsql database, one JSON document per row
//! - `MemoryCollection`, an in-memory implementation for tests and
//!   throwaway runs
//! - `LiveQuery`, which turns the change feed into "document entered the
//!   result set" notifications
//!
//! # Architecture
//!
//! Services hold collections as `Arc<dyn Collection<D>>`. Concurrency safety
//! for mutations comes from the storage layer alone: each single-document
//! update is applied atomically against its selector, and callers encode the
//! snapshot they expect in that selector.

mod collection;
mod error;
pub mod events;
mod libsql_store;
mod live_query;
mod memory_store;

pub use collection::{
    Collection, Document, FindOptions, SharedCollection, SortField, UpdateOptions,
};
pub use error::StoreError;
pub use events::CollectionEvent;
pub use libsql_store::{LibsqlCollection, LibsqlDatabase};
pub use live_query::LiveQuery;
pub use memory_store::MemoryCollection;
