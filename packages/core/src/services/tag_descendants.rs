//! Descendant lookup for the tag tree
//!
//! Two interchangeable strategies with the same contract (every transitive
//! descendant, the tag itself excluded):
//!
//! - `get_all_descendants` walks parent pointers level by level. It does not
//!   depend on cached paths, at the cost of one query per expanded tag.
//! - `get_all_descendants_by_path` runs a single query over cached paths. It
//!   is only complete while every path is up to date; a tag with a stale or
//!   missing path is silently left out.

use super::error::ServiceError;
use super::tag_service::TagService;
use crate::db::FindOptions;
use crate::models::{IdMatch, PathMatch, TagRecord, TagSelector};
use std::collections::{HashSet, VecDeque};

impl TagService {
    /// Breadth-first descendant search over `parent_tag_id`
    pub async fn get_all_descendants(&self, tag: &TagRecord) -> Result<Vec<TagRecord>, ServiceError> {
        let tags = self.collection();

        let mut seen: HashSet<String> = HashSet::from([tag.id.clone()]);
        let mut to_check: VecDeque<String> = VecDeque::from([tag.id.clone()]);
        let mut descendants = Vec::new();

        while let Some(tag_id) = to_check.pop_front() {
            let children = tags
                .find(&TagSelector::children_of(tag_id), FindOptions::default())
                .await?;

            for child in children {
                // A corrupted (cyclic) tree must not loop forever
                if seen.insert(child.id.clone()) {
                    to_check.push_back(child.id.clone());
                    descendants.push(child);
                }
            }
        }

        Ok(descendants)
    }

    /// Single-query descendant search over cached paths
    ///
    /// Matches every other tag whose path has an element with this tag's id
    /// and name. Assumes all paths are complete and correct.
    pub async fn get_all_descendants_by_path(
        &self,
        tag: &TagRecord,
    ) -> Result<Vec<TagRecord>, ServiceError> {
        let selector = TagSelector {
            id: Some(IdMatch::Ne(tag.id.clone())),
            path: Some(PathMatch::ContainsEntry(tag.path_node())),
            ..TagSelector::default()
        };

        Ok(self
            .collection()
            .find(&selector, FindOptions::default())
            .await?)
    }
}
