//! TagStock Core Business Logic Layer
//!
//! This crate provides the data management and service layer for the TagStock
//! inventory system: a hierarchical tag tree with cached materialized paths,
//! and flat inventory items.
//!
//! # Architecture
//!
//! - **Cached paths**: every tag stores its ancestor chain; mutators cascade
//!   changes and `fix_path` repairs what a cascade missed
//! - **Optimistic concurrency**: writes against a known snapshot go through
//!   strict selectors, never read-then-write
//! - **Self-healing**: a background watcher repairs tags without a path
//!
//! # Modules
//!
//! - [`models`] - Records, inputs, typed selectors and patches
//! - [`db`] - Collection trait, in-memory store, change feed, live queries
//! - [`services`] - TagService, ItemService, PathRepairWatcher, seeding
//! - [`rpc`] - JSON-RPC 2.0 over stdio or HTTP
//! - [`config`] - Environment-driven runtime configuration

pub mod config;
pub mod db;
pub mod models;
pub mod rpc;
pub mod services;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError, Transport};
pub use models::*;
pub use services::*;
