//! Collection Trait - Document Storage Abstraction
//!
//! This module defines the `Collection` trait that abstracts the document
//! store backing tags and inventory items. Business logic in the services
//! layer only talks to `Arc<dyn Collection<D>>`, so a different storage
//! engine can be dropped in without touching the tag-tree algorithms.
//!
//! # Storage Protocol
//!
//! - **Selectors** are typed partial-match predicates (`TagSelector`,
//!   `ItemSelector`); unset fields match anything.
//! - **Patches** are typed partial-field updates (`TagPatch`, `ItemPatch`),
//!   including an array-element patch for cached tag paths.
//! - **Single-document atomicity**: an update either fully applies to a
//!   document that matches the selector at write time, or is a no-op. This
//!   is what makes strict-selector updates behave as compare-and-swap.
//! - **No multi-document transactions**: a `multi` update applies per
//!   document; callers must tolerate partial application.
//! - **Change feed**: `subscribe()` yields every applied write.

use super::error::StoreError;
use super::events::CollectionEvent;
use crate::models::{
    CollectionItem, InventoryItem, ItemPatch, ItemSelector, TagPatch, TagRecord, TagSelector,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A record type that can live in a collection.
pub trait Document:
    CollectionItem + Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Partial-match predicate over this document type
    type Selector: Clone + fmt::Debug + Send + Sync + 'static;

    /// Partial-field update for this document type
    type Patch: fmt::Debug + Send + Sync;

    fn set_id(&mut self, id: String);

    fn matches(&self, selector: &Self::Selector) -> bool;

    fn apply(&mut self, patch: &Self::Patch);

    /// Value used by `SortField::Name`
    fn sort_name(&self) -> &str;

    /// The single id a selector pins, if any; lets storage engines look the
    /// document up by key instead of scanning
    fn selected_id(selector: &Self::Selector) -> Option<&str>;
}

impl Document for TagRecord {
    type Selector = TagSelector;
    type Patch = TagPatch;

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn matches(&self, selector: &TagSelector) -> bool {
        selector.matches(self)
    }

    fn apply(&mut self, patch: &TagPatch) {
        patch.apply(self);
    }

    fn sort_name(&self) -> &str {
        &self.name
    }

    fn selected_id(selector: &TagSelector) -> Option<&str> {
        selector.id.as_ref().and_then(|m| m.exact())
    }
}

impl Document for InventoryItem {
    type Selector = ItemSelector;
    type Patch = ItemPatch;

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn matches(&self, selector: &ItemSelector) -> bool {
        selector.matches(self)
    }

    fn apply(&mut self, patch: &ItemPatch) {
        patch.apply(self);
    }

    fn sort_name(&self) -> &str {
        &self.name
    }

    fn selected_id(selector: &ItemSelector) -> Option<&str> {
        selector.id.as_ref().and_then(|m| m.exact())
    }
}

/// Ascending sort keys supported by `find`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Name,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    /// `None` keeps insertion order
    pub sort: Option<SortField>,
}

impl FindOptions {
    pub fn sorted_by(field: SortField) -> Self {
        Self { sort: Some(field) }
    }

    /// Order `documents` (already in insertion order) as requested
    pub fn sort<D: Document>(&self, documents: &mut [D]) {
        match self.sort {
            Some(SortField::CreatedAt) => documents.sort_by_key(|d| d.created_at()),
            Some(SortField::Name) => documents.sort_by(|a, b| a.sort_name().cmp(b.sort_name())),
            None => {}
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Update every matching document instead of the first one
    pub multi: bool,
}

impl UpdateOptions {
    pub fn single() -> Self {
        Self { multi: false }
    }

    pub fn multi() -> Self {
        Self { multi: true }
    }
}

/// Abstraction layer for document persistence
///
/// Implementations must be `Send + Sync`; services hold them as
/// `Arc<dyn Collection<D>>` and share them across spawned tasks.
#[async_trait]
pub trait Collection<D: Document>: Send + Sync {
    /// Name of the collection, used in errors and log lines
    fn collection_name(&self) -> &str;

    /// Insert a document and return its id
    ///
    /// An empty `id` is replaced by a freshly generated UUID. Inserting an
    /// id that already exists fails with `StoreError::DuplicateId`.
    async fn insert(&self, doc: D) -> Result<String, StoreError>;

    /// All documents matching `selector`
    async fn find(&self, selector: &D::Selector, options: FindOptions)
        -> Result<Vec<D>, StoreError>;

    /// First document matching `selector`, in insertion order
    async fn find_one(&self, selector: &D::Selector) -> Result<Option<D>, StoreError>;

    /// Apply `patch` to the first (or, with `multi`, every) matching document
    ///
    /// Returns the number of documents updated. Zero is a legitimate outcome
    /// (nothing matched), not an error.
    async fn update(
        &self,
        selector: &D::Selector,
        patch: &D::Patch,
        options: UpdateOptions,
    ) -> Result<u64, StoreError>;

    /// Remove every matching document, returning how many were removed
    async fn remove(&self, selector: &D::Selector) -> Result<u64, StoreError>;

    async fn count(&self, selector: &D::Selector) -> Result<u64, StoreError>;

    /// Subscribe to the change feed of this collection
    fn subscribe(&self) -> broadcast::Receiver<CollectionEvent<D>>;
}

/// Shared handle to a collection
pub type SharedCollection<D> = Arc<dyn Collection<D>>;
