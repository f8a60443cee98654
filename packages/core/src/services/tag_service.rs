//! Tag Service - Tag Tree Operations
//!
//! This module provides the business logic for the tag tree:
//!
//! - Path resolution (`resolve_path`), optionally repairing stale ancestor
//!   paths while resolving
//! - Mutators (`create_tag`, `rename_tag`, `set_tag_parent`, `remove_tag`,
//!   `fix_path`) that keep cached paths consistent
//! - Descendant lookup and the detached-tag sweep (see `tag_descendants` and
//!   `detached_tags`)
//!
//! # Cached Paths
//!
//! Every tag caches its ancestor chain in `path`, root first, ending with the
//! tag itself. Mutators recompute or cascade that cache, but multi-document
//! cascades are not transactional. Stale paths are repaired later by
//! `fix_path`, either on demand or by the `PathRepairWatcher`.
//!
//! # Optimistic Concurrency
//!
//! Writes to a tag the caller already holds go through a strict selector built
//! from the caller's snapshot (`TagSelector::strict`). If another writer
//! changed the record in between, the update matches nothing and the mutator
//! reports `false`/`0` instead of overwriting the newer state.
//!
//! # Removal
//!
//! `remove_tag` deletes exactly one record. Children are left pointing at the
//! removed id and become detached; `get_detached_tags` finds them.

use crate::db::{FindOptions, SharedCollection, SortField, UpdateOptions};
use crate::models::{
    IdMatch, PathMatch, PathNode, StrictField, TagInput, TagPatch, TagPath, TagRecord, TagRef,
    TagSelector, ValidationError,
};
use crate::services::error::ServiceError;
use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Policy switches for `TagService`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagServiceConfig {
    /// Repair stale ancestor paths as a side effect of path resolution
    ///
    /// Applies to `create_tag` and `fix_path`.
    pub fix_path: bool,
}

pub struct TagService {
    tags: SharedCollection<TagRecord>,
    config: TagServiceConfig,
}

impl TagService {
    pub fn new(tags: SharedCollection<TagRecord>, config: TagServiceConfig) -> Self {
        Self { tags, config }
    }

    pub fn config(&self) -> TagServiceConfig {
        self.config
    }

    /// The underlying tags collection
    pub fn collection(&self) -> SharedCollection<TagRecord> {
        self.tags.clone()
    }

    pub async fn get_tag(&self, id: &str) -> Result<Option<TagRecord>, ServiceError> {
        Ok(self.tags.find_one(&TagSelector::by_id(id)).await?)
    }

    /// All tags, oldest first
    pub async fn list_tags(&self) -> Result<Vec<TagRecord>, ServiceError> {
        Ok(self
            .tags
            .find(&TagSelector::all(), FindOptions::sorted_by(SortField::CreatedAt))
            .await?)
    }

    /// Load the tag a child wants to hang under
    ///
    /// # Errors
    ///
    /// `RecordNotFound` ("Parent Tag not found") carrying the failed selector.
    pub async fn assert_parent_tag(&self, parent_tag_id: &str) -> Result<TagRecord, ServiceError> {
        self.tags
            .find_one(&TagSelector::by_id(parent_tag_id))
            .await?
            .ok_or_else(|| {
                ServiceError::record_not_found("Parent Tag not found", json!({ "_id": parent_tag_id }))
            })
    }

    /// Compute the ancestor path of `tag`
    ///
    /// Without `fix`, a cached `tag.path` is returned as is, and the walk up
    /// the tree stops at the first ancestor that has a cached path. With
    /// `fix`, the whole chain up to the root is recomputed from parent
    /// pointers and every ancestor whose stored path differs from the
    /// recomputed one is rewritten (root-most first). Those writes use a
    /// strict selector on the ancestor snapshot, so an ancestor changed
    /// concurrently is left alone.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` when an ancestor is missing (the tag is detached)
    /// - `CircularReference` when the parent chain loops
    pub async fn resolve_path(&self, tag: TagRef<'_>, fix: bool) -> Result<TagPath, ServiceError> {
        if !fix {
            if let Some(path) = tag.path {
                return Ok(path.to_vec());
            }
        }

        if tag.parent_tag_id.is_empty() {
            return Ok(vec![PathNode::new(tag.id, tag.name)]);
        }

        let parent = self.assert_parent_tag(tag.parent_tag_id).await?;
        self.resolve_path_under(tag, parent, fix).await
    }

    /// Path of `tag` placed under the already loaded `parent`
    async fn resolve_path_under(
        &self,
        tag: TagRef<'_>,
        parent: TagRecord,
        fix: bool,
    ) -> Result<TagPath, ServiceError> {
        let mut visited: HashSet<String> = HashSet::new();
        if !tag.id.is_empty() {
            visited.insert(tag.id.to_string());
        }

        // Ancestors from the parent upwards, stopping at a root or, outside
        // fix mode, at the first cached path.
        let mut ancestors: Vec<TagRecord> = Vec::new();
        let mut current = parent;
        loop {
            if !visited.insert(current.id.clone()) {
                return Err(ServiceError::circular_reference(format!(
                    "tag '{}' appears twice in the ancestry of '{}'",
                    current.id, tag.id
                )));
            }

            let stop = current.is_root() || (!fix && current.path.is_some());
            let next_parent_id = current.parent_tag_id.clone();
            ancestors.push(current);
            if stop {
                break;
            }
            current = self.assert_parent_tag(&next_parent_id).await?;
        }

        let mut path: TagPath = Vec::new();
        for ancestor in ancestors.iter().rev() {
            let resolved = match (&ancestor.path, path.is_empty()) {
                (Some(cached), true) if !fix => cached.clone(),
                _ => {
                    let mut resolved = path.clone();
                    resolved.push(ancestor.path_node());
                    resolved
                }
            };

            if fix && ancestor.path.as_ref() != Some(&resolved) {
                info!(
                    tag_id = %ancestor.id,
                    "Fixing path for tag \"{}\" ({}).",
                    ancestor.name,
                    ancestor.id
                );
                self.tags
                    .update(
                        &TagSelector::strict(ancestor, &[StrictField::Name, StrictField::ParentTagId]),
                        &TagPatch::touch().path(resolved.clone()),
                        UpdateOptions::single(),
                    )
                    .await?;
            }

            path = resolved;
        }

        path.push(PathNode::new(tag.id, tag.name));
        Ok(path)
    }

    /// Create a tag and return its id
    ///
    /// `parent_tag_id` defaults to `""` (root). The id is generated before the
    /// insert so the cached path ends with the tag's real id.
    ///
    /// # Errors
    ///
    /// - `Validation` ("Tag must have a name.") when `name` is absent
    /// - `RecordNotFound` when the parent does not exist
    #[instrument(skip(self, input), fields(name = ?input.name, parent_tag_id = ?input.parent_tag_id))]
    pub async fn create_tag(&self, input: TagInput) -> Result<String, ServiceError> {
        let TagInput {
            name,
            parent_tag_id,
        } = input;

        let name = name.ok_or(ValidationError::MissingName { entity: "Tag" })?;
        let parent_tag_id = parent_tag_id.unwrap_or_default();

        let mut tag = TagRecord::new(name, parent_tag_id);
        tag.id = Uuid::new_v4().to_string();

        let path = if tag.is_root() {
            vec![tag.path_node()]
        } else {
            let parent = self.assert_parent_tag(&tag.parent_tag_id).await?;
            self.resolve_path_under(tag.as_tag_ref(), parent, self.config.fix_path)
                .await?
        };
        tag.path = Some(path);

        let tag_id = self.tags.insert(tag).await?;
        debug!(tag_id = %tag_id, "Created tag");

        Ok(tag_id)
    }

    /// Rename `tag` and the cached path entries that refer to it
    ///
    /// The primary update only applies while the stored record still matches
    /// the snapshot (id, timestamps, name). When it does, every other tag
    /// whose path contains this tag under a different name gets that single
    /// path element rewritten.
    ///
    /// Returns whether the tag itself was updated; the cascade count is only
    /// logged. The two updates are not atomic: a failure in between leaves
    /// descendants with a stale name in their paths.
    #[instrument(skip(self, tag), fields(tag_id = %tag.id))]
    pub async fn rename_tag(&self, tag: &TagRecord, new_name: &str) -> Result<bool, ServiceError> {
        debug!(old_name = %tag.name, new_name, "renameTag <=");

        let now = Utc::now();
        let mut tags_updated = self
            .tags
            .update(
                &TagSelector::strict(tag, &[StrictField::Name]),
                &TagPatch::default()
                    .name(new_name)
                    .rename_path_entry(&tag.id, new_name)
                    .modified_at(now),
                UpdateOptions::single(),
            )
            .await?;

        let tag_is_updated = tags_updated > 0;

        if tag_is_updated {
            let descendants = TagSelector {
                id: Some(IdMatch::Ne(tag.id.clone())),
                path: Some(PathMatch::ContainsIdWithOtherName {
                    id: tag.id.clone(),
                    name: new_name.to_string(),
                }),
                ..TagSelector::default()
            };

            tags_updated += self
                .tags
                .update(
                    &descendants,
                    &TagPatch::default()
                        .rename_path_entry(&tag.id, new_name)
                        .modified_at(now),
                    UpdateOptions::multi(),
                )
                .await?;
        }

        info!(new_name, tags_updated, "renameTag =>");

        Ok(tag_is_updated)
    }

    /// Move `tag` under `new_parent_tag_id` (`""` makes it a root)
    ///
    /// The primary update pins the snapshot (id, timestamps, parent) and sets
    /// the new parent together with the freshly resolved path. When it
    /// applies, every descendant found through the old path is re-resolved
    /// with `fix_path`, shallowest first so each one finds its parent already
    /// updated.
    ///
    /// Returns the number of updated records (the tag plus cascaded
    /// descendants).
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` when the new parent does not exist
    /// - `CircularReference` when the new parent is the tag or one of its
    ///   descendants
    #[instrument(skip(self, tag), fields(tag_id = %tag.id))]
    pub async fn set_tag_parent(
        &self,
        tag: &TagRecord,
        new_parent_tag_id: &str,
    ) -> Result<u64, ServiceError> {
        debug!(
            old_parent_tag_id = %tag.parent_tag_id,
            new_parent_tag_id,
            "setTagParent <="
        );

        let path = if new_parent_tag_id.is_empty() {
            vec![tag.path_node()]
        } else {
            let parent = self.assert_parent_tag(new_parent_tag_id).await?;
            self.ensure_not_descendant(&parent, &tag.id).await?;
            self.resolve_path_under(tag.as_tag_ref().with_parent(new_parent_tag_id), parent, false)
                .await?
        };

        let mut tags_updated = self
            .tags
            .update(
                &TagSelector::strict(tag, &[StrictField::ParentTagId]),
                &TagPatch::touch()
                    .parent_tag_id(new_parent_tag_id)
                    .path(path),
                UpdateOptions::single(),
            )
            .await?;

        if tags_updated > 0 {
            let mut descendants = self.get_all_descendants_by_path(tag).await?;
            descendants.sort_by_key(|d| d.path.as_ref().map_or(0, Vec::len));

            for descendant in &descendants {
                tags_updated += self.fix_path(descendant).await?;
            }
        }

        info!(new_parent_tag_id, tags_updated, "setTagParent =>");

        Ok(tags_updated)
    }

    /// Fail when `candidate` is `tag_id` itself or lies below it
    ///
    /// Walks parent pointers up from `candidate`; a missing ancestor ends the
    /// walk, since a detached chain cannot lead back to `tag_id`.
    async fn ensure_not_descendant(
        &self,
        candidate: &TagRecord,
        tag_id: &str,
    ) -> Result<(), ServiceError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = Some(candidate.clone());

        while let Some(tag) = current {
            if tag.id == tag_id {
                return Err(ServiceError::circular_reference(format!(
                    "cannot move tag '{}' under '{}', which is the tag itself or one of its descendants",
                    tag_id, candidate.id
                )));
            }
            if !visited.insert(tag.id.clone()) || tag.is_root() {
                break;
            }
            current = self.get_tag(&tag.parent_tag_id).await?;
        }

        Ok(())
    }

    /// Remove exactly one tag; its children are left detached
    #[instrument(skip(self))]
    pub async fn remove_tag(&self, tag_id: &str) -> Result<bool, ServiceError> {
        let removed = self.tags.remove(&TagSelector::by_id(tag_id)).await?;
        debug!(removed, "removeTag");
        Ok(removed > 0)
    }

    /// Recompute and store the path of `tag`
    ///
    /// The tag's own cached path is never trusted; its ancestors are resolved
    /// with the configured `fix_path` policy. The write pins the snapshot (id,
    /// timestamps, name), so calling this with an outdated snapshot is a
    /// no-op returning 0.
    #[instrument(skip(self, tag), fields(tag_id = %tag.id))]
    pub async fn fix_path(&self, tag: &TagRecord) -> Result<u64, ServiceError> {
        let path = self
            .resolve_path(tag.as_tag_ref().without_path(), self.config.fix_path)
            .await?;

        let updated = self
            .tags
            .update(
                &TagSelector::strict(tag, &[StrictField::Name]),
                &TagPatch::touch().path(path),
                UpdateOptions::single(),
            )
            .await?;

        Ok(updated)
    }
}
