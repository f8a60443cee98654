//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `TagService` - tag tree: path resolution, mutators, descendant lookup,
//!   detached-tag sweep
//! - `PathRepairWatcher` - background task repairing tags without a path
//! - `ItemService` - inventory item creation and listing
//! - `seed_sample_data` - sample records for an empty database
//!
//! Services coordinate between the database layer and the remote-operation
//! layer, implementing business rules on top of the `Collection` trait.

mod detached_tags;
pub mod error;
pub mod item_service;
pub mod path_repair;
pub mod seed;
mod tag_descendants;
pub mod tag_service;



pub use error::ServiceError;
pub use item_service::ItemService;
pub use path_repair::PathRepairWatcher;
pub use seed::seed_sample_data;
pub use tag_service::{TagService, TagServiceConfig};
