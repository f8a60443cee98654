//! In-memory collection
//!
//! Documents are kept in insertion order behind a tokio `RwLock`. Writers hold
//! the lock for the whole match-then-patch step, which gives the
//! single-document compare-and-swap semantics strict selectors rely on.
//! Nothing is persisted; `LibsqlCollection` is the durable backend.

use super::collection::{Collection, Document, FindOptions, UpdateOptions};
use super::error::StoreError;
use super::events::{CollectionEvent, EVENT_CHANNEL_CAPACITY};
use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

pub struct MemoryCollection<D: Document> {
    name: String,
    documents: RwLock<Vec<D>>,
    events: broadcast::Sender<CollectionEvent<D>>,
}

impl<D: Document> MemoryCollection<D> {
    /// Create an empty collection
    pub fn new(name: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
            events,
        }
    }

    fn emit(&self, event: CollectionEvent<D>) {
        tracing::trace!(collection = %self.name, event = event.event_type(), "Change event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl<D: Document> Collection<D> for MemoryCollection<D> {
    fn collection_name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, mut doc: D) -> Result<String, StoreError> {
        if doc.id().is_empty() {
            doc.set_id(Uuid::new_v4().to_string());
        }
        let id = doc.id().to_string();

        let mut documents = self.documents.write().await;
        if documents.iter().any(|d| d.id() == id) {
            return Err(StoreError::duplicate_id(&self.name, id));
        }

        documents.push(doc.clone());

        self.emit(CollectionEvent::Inserted(doc));
        Ok(id)
    }

    async fn find(
        &self,
        selector: &D::Selector,
        options: FindOptions,
    ) -> Result<Vec<D>, StoreError> {
        let documents = self.documents.read().await;
        let mut found: Vec<D> = documents
            .iter()
            .filter(|d| d.matches(selector))
            .cloned()
            .collect();

        options.sort(&mut found);
        Ok(found)
    }

    async fn find_one(&self, selector: &D::Selector) -> Result<Option<D>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|d| d.matches(selector)).cloned())
    }

    async fn update(
        &self,
        selector: &D::Selector,
        patch: &D::Patch,
        options: UpdateOptions,
    ) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;

        let mut updated: Vec<D> = Vec::new();
        for doc in documents.iter_mut() {
            if !doc.matches(selector) {
                continue;
            }
            doc.apply(patch);
            updated.push(doc.clone());
            if !options.multi {
                break;
            }
        }

        let count = updated.len() as u64;
        for doc in updated {
            self.emit(CollectionEvent::Updated(doc));
        }

        Ok(count)
    }

    async fn remove(&self, selector: &D::Selector) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;

        let (removed, kept): (Vec<D>, Vec<D>) =
            documents.drain(..).partition(|d| d.matches(selector));
        *documents = kept;

        for doc in &removed {
            self.emit(CollectionEvent::Removed {
                id: doc.id().to_string(),
            });
        }

        Ok(removed.len() as u64)
    }

    async fn count(&self, selector: &D::Selector) -> Result<u64, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().filter(|d| d.matches(selector)).count() as u64)
    }

    fn subscribe(&self) -> broadcast::Receiver<CollectionEvent<D>> {
        self.events.subscribe()
    }
}
