//! Background Path Repair
//!
//! Watches the tags collection for tags without a cached `path` and repairs
//! them with `TagService::fix_path`:
//!
//! - Event-driven: driven by a `LiveQuery` on the collection's change feed,
//!   no polling
//! - Fire-and-forget: every observed tag is repaired in its own spawned task
//! - Error isolation: a failed repair is logged and dropped; the watch keeps
//!   running
//! - Stale snapshots: a tag that changed between the change event and the
//!   repair is re-read and retried, because the live query will not report
//!   it again while it stays without a path
//!
//! The watcher is meant to be started once at process startup and to live as
//! long as the process. Dropping the handle does NOT stop it; call
//! `shutdown()` to stop it explicitly.

use super::error::ServiceError;
use super::tag_service::TagService;
use crate::db::LiveQuery;
use crate::models::{TagRecord, TagSelector};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const MAX_REPAIR_ATTEMPTS: usize = 3;

/// Handle to a running path repair watch
pub struct PathRepairWatcher {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PathRepairWatcher {
    /// Start watching for tags without a path
    ///
    /// Tags already missing a path when the watch starts are repaired too.
    pub async fn start(service: Arc<TagService>) -> Result<Self, ServiceError> {
        tracing::info!("👀 Watching for tags without path...");

        let mut missing_path = LiveQuery::start(service.collection(), TagSelector::missing_path()).await?;
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased; // Check shutdown first

                    Some(_) = shutdown_rx.recv() => {
                        tracing::info!("🛑 PathRepairWatcher shutting down");
                        break;
                    }

                    next = missing_path.next_added() => {
                        let Some(tag) = next else {
                            tracing::warn!("⚠️ Tags change feed closed, path repair watch stopped");
                            break;
                        };

                        let service = service.clone();
                        tokio::spawn(async move {
                            tracing::info!(tag_id = %tag.id, name = %tag.name, "🔧 Found tag without path");
                            repair_missing_path(&service, tag).await;
                        });
                    }
                }
            }
        });

        Ok(Self { shutdown_tx, task })
    }

    /// Whether the background task is still running
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the watch and wait for the background task to exit
    ///
    /// Repairs already spawned are not cancelled.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::warn!("❌ PathRepairWatcher task ended abnormally: {}", e);
        }
    }
}

/// Repair one tag reported without a path; returns whether a path was written
///
/// `fix_path` pins the snapshot, so it updates nothing when the tag changed
/// in the meantime. The tag is then re-read: a tag that was removed or gained
/// a path needs nothing more, one still without a path is retried with the
/// current record.
pub(crate) async fn repair_missing_path(service: &TagService, mut tag: TagRecord) -> bool {
    for attempt in 1..=MAX_REPAIR_ATTEMPTS {
        match service.fix_path(&tag).await {
            Ok(0) => {}
            Ok(_) => {
                tracing::debug!(tag_id = %tag.id, attempt, "Path repaired");
                return true;
            }
            Err(e) => {
                tracing::warn!(tag_id = %tag.id, "❌ Path fixing failed: {}", e);
                return false;
            }
        }

        match service.get_tag(&tag.id).await {
            Ok(Some(current)) if current.path.is_none() => {
                tracing::debug!(tag_id = %tag.id, attempt, "Tag changed before its path was fixed, retrying");
                tag = current;
            }
            Ok(_) => {
                tracing::debug!(tag_id = %tag.id, "Tag removed or already has a path");
                return false;
            }
            Err(e) => {
                tracing::warn!(tag_id = %tag.id, "❌ Failed to re-read tag for path repair: {}", e);
                return false;
            }
        }
    }

    tracing::warn!(
        tag_id = %tag.id,
        attempts = MAX_REPAIR_ATTEMPTS,
        "⚠️ Tag kept changing during path repair and is still without path"
    );
    false
}
