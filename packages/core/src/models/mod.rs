//! Data Models
//!
//! This module contains the records stored by TagStock:
//!
//! - `TagRecord` - node of the tag tree with its cached ancestor path
//! - `InventoryItem` - flat inventory entity
//!
//! Each record type comes with a typed selector (partial-match predicate)
//! and patch (partial-field update) used by the `db` layer.

mod collection_item;
mod item;
mod tag;

pub use collection_item::{CollectionItem, IdMatch};
pub use item::{InventoryItem, ItemInput, ItemPatch, ItemSelector};
pub use tag::{
    PathMatch, PathNode, StrictField, TagInput, TagPatch, TagPath, TagRecord, TagRef, TagSelector,
};

use thiserror::Error;

/// Input validation errors raised before anything is written
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Record created without a name ("Tag must have a name.")
    #[error("{entity} must have a name.")]
    MissingName { entity: &'static str },
}
