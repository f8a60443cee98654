//! Live queries over a collection's change feed
//!
//! A `LiveQuery` reports every document that *enters* the result set of a
//! selector: first the documents matching when the query starts, then any
//! document inserted or updated into a matching state. A document that leaves
//! the result set and later matches again is reported again.
//!
//! When the subscriber lags behind the broadcast channel, the query re-reads
//! the collection and reports whatever became a match in the meantime.

use super::collection::{Document, FindOptions, SharedCollection};
use super::error::StoreError;
use super::events::CollectionEvent;
use std::collections::{HashSet, VecDeque};
use tokio::sync::broadcast::{self, error::RecvError};

pub struct LiveQuery<D: Document> {
    collection: SharedCollection<D>,
    selector: D::Selector,
    events: broadcast::Receiver<CollectionEvent<D>>,
    matching: HashSet<String>,
    pending: VecDeque<D>,
}

impl<D: Document> LiveQuery<D> {
    /// Start observing `selector` on `collection`
    ///
    /// Subscribes before reading the initial result set so no write can slip
    /// between the two.
    pub async fn start(
        collection: SharedCollection<D>,
        selector: D::Selector,
    ) -> Result<Self, StoreError> {
        let events = collection.subscribe();
        let initial = collection.find(&selector, FindOptions::default()).await?;

        let matching = initial.iter().map(|d| d.id().to_string()).collect();

        Ok(Self {
            collection,
            selector,
            events,
            matching,
            pending: initial.into(),
        })
    }

    /// Wait for the next document that newly matches the selector
    ///
    /// Returns `None` once the collection's change feed has closed.
    pub async fn next_added(&mut self) -> Option<D> {
        loop {
            if let Some(doc) = self.pending.pop_front() {
                return Some(doc);
            }

            match self.events.recv().await {
                Ok(CollectionEvent::Inserted(doc)) | Ok(CollectionEvent::Updated(doc)) => {
                    if doc.matches(&self.selector) {
                        if self.matching.insert(doc.id().to_string()) {
                            return Some(doc);
                        }
                    } else {
                        self.matching.remove(doc.id());
                    }
                }
                Ok(CollectionEvent::Removed { id }) => {
                    self.matching.remove(&id);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        collection = self.collection.collection_name(),
                        skipped,
                        "Live query lagged behind change feed, re-reading"
                    );
                    self.resync().await;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    async fn resync(&mut self) {
        let current = match self
            .collection
            .find(&self.selector, FindOptions::default())
            .await
        {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!(
                    collection = self.collection.collection_name(),
                    "Live query resync failed: {}",
                    e
                );
                return;
            }
        };

        let mut matching = HashSet::with_capacity(current.len());
        for doc in current {
            let id = doc.id().to_string();
            if !self.matching.contains(&id) {
                self.pending.push_back(doc);
            }
            matching.insert(id);
        }
        self.matching = matching;
    }
}
