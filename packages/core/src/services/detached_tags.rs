//! Detached-tag sweep
//!
//! A tag is detached when its ancestor chain does not reach a root because
//! some `parent_tag_id` along the way points at a tag that no longer exists.
//! The sweep only follows parent pointers, so stale cached paths do not
//! affect it. It reads without snapshot isolation: concurrent writes can
//! leave the result reflecting a mix of before and after states.

use super::error::ServiceError;
use super::tag_service::TagService;
use crate::db::{FindOptions, SharedCollection};
use crate::models::{TagRecord, TagSelector};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, instrument};

/// Bookkeeping shared by both phases of the sweep
#[derive(Default)]
struct Sweep {
    detached: HashSet<String>,
    checked: HashSet<String>,
    queued: HashSet<String>,
    to_check: VecDeque<String>,
}

impl Sweep {
    fn enqueue(&mut self, tag_id: &str) {
        if self.queued.insert(tag_id.to_string()) {
            self.to_check.push_back(tag_id.to_string());
        }
    }

    /// Mark `root_id` and everything below it as detached
    async fn mark_subtree(
        &mut self,
        tags: &SharedCollection<TagRecord>,
        root_id: &str,
    ) -> Result<(), ServiceError> {
        let mut pending = VecDeque::from([root_id.to_string()]);

        while let Some(tag_id) = pending.pop_front() {
            if !self.detached.insert(tag_id.clone()) {
                continue;
            }
            self.checked.insert(tag_id.clone());

            let children = tags
                .find(&TagSelector::children_of(&tag_id), FindOptions::default())
                .await?;
            pending.extend(children.into_iter().map(|c| c.id));
        }

        Ok(())
    }
}

impl TagService {
    /// Ids of every tag whose ancestry is broken
    ///
    /// 1. Seed: every non-root tag whose immediate parent is missing is marked
    ///    detached together with its subtree; the parents of the others are
    ///    queued for an ancestor check.
    /// 2. Walk: each queued tag is checked once. A root ends the walk, a
    ///    missing parent marks the checked tag's whole subtree detached, and
    ///    otherwise the check moves on to the grandparent.
    ///
    /// The order of the returned ids is unspecified.
    #[instrument(skip(self))]
    pub async fn get_detached_tags(&self) -> Result<Vec<String>, ServiceError> {
        let tags = self.collection();
        let mut sweep = Sweep::default();

        for tag in tags.find(&TagSelector::non_root(), FindOptions::default()).await? {
            let parent_tag_id = &tag.parent_tag_id;
            if sweep.queued.contains(parent_tag_id) || sweep.detached.contains(parent_tag_id) {
                continue;
            }

            let parent_exists = tags.count(&TagSelector::by_id(parent_tag_id)).await? > 0;
            if parent_exists {
                sweep.enqueue(parent_tag_id);
            } else {
                sweep.mark_subtree(&tags, &tag.id).await?;
            }
        }

        while let Some(tag_id) = sweep.to_check.pop_front() {
            if !sweep.checked.insert(tag_id.clone()) {
                continue;
            }

            let Some(tag) = tags.find_one(&TagSelector::by_id(&tag_id)).await? else {
                // Removed while sweeping
                continue;
            };

            if tag.is_root() {
                continue;
            }

            let parent_exists = tags.count(&TagSelector::by_id(&tag.parent_tag_id)).await? > 0;
            if parent_exists {
                sweep.enqueue(&tag.parent_tag_id);
            } else {
                sweep.mark_subtree(&tags, &tag_id).await?;
            }
        }

        debug!(detached = sweep.detached.len(), "Detached tag sweep finished");

        Ok(sweep.detached.into_iter().collect())
    }
}
