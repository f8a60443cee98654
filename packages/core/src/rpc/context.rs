//! Shared state behind every RPC transport

use crate::services::{ItemService, PathRepairWatcher, ServiceError, TagService};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct RpcContext {
    pub tags: Arc<TagService>,
    pub items: Arc<ItemService>,
    watcher: Mutex<Option<PathRepairWatcher>>,
}

impl RpcContext {
    pub fn new(tags: Arc<TagService>, items: Arc<ItemService>) -> Self {
        Self {
            tags,
            items,
            watcher: Mutex::new(None),
        }
    }

    /// Start the path repair watcher unless one is already running
    ///
    /// Returns whether a new watcher was started by this call.
    pub async fn ensure_watcher(&self) -> Result<bool, ServiceError> {
        let mut watcher = self.watcher.lock().await;
        if watcher.as_ref().is_some_and(PathRepairWatcher::is_running) {
            return Ok(false);
        }

        *watcher = Some(PathRepairWatcher::start(self.tags.clone()).await?);
        Ok(true)
    }

    pub async fn watcher_running(&self) -> bool {
        self.watcher
            .lock()
            .await
            .as_ref()
            .is_some_and(PathRepairWatcher::is_running)
    }

    /// Stop the watcher, if any
    pub async fn shutdown(&self) {
        if let Some(watcher) = self.watcher.lock().await.take() {
            watcher.shutdown().await;
        }
    }
}
