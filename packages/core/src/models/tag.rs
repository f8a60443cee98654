//! Tag records and the typed selector/patch used to query and update them.
//!
//! Tags form a tree through `parent_tag_id` (`""` marks a root). Every tag may
//! carry a cached `path`: its ancestor chain, root first, ending with the tag
//! itself. The cache is denormalized, so structural changes elsewhere in the
//! tree can leave it stale until it is recomputed.

use super::collection_item::{CollectionItem, IdMatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One element of a cached tag path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathNode {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

impl PathNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Ancestor chain of a tag, root first, including the tag itself last.
pub type TagPath = Vec<PathNode>;

/// A node of the tag tree as stored in the tags collection.
///
/// # Examples
///
/// ```rust
/// # use tagstock_core::models::TagRecord;
/// let root = TagRecord::new("Kitchen".to_string(), String::new());
/// assert!(root.is_root());
/// assert!(root.path.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecord {
    /// Unique identifier, assigned on insert
    #[serde(rename = "_id")]
    pub id: String,

    /// Display name of the tag
    pub name: String,

    /// ID of the parent tag; empty when the tag is a root
    #[serde(default)]
    pub parent_tag_id: String,

    /// Cached ancestor chain; absent on legacy or not-yet-repaired records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<TagPath>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl TagRecord {
    /// Create an unsaved tag with both timestamps set to now and no id.
    pub fn new(name: String, parent_tag_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name,
            parent_tag_id,
            path: None,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_tag_id.is_empty()
    }

    /// Leaf element this tag contributes to its own path.
    pub fn path_node(&self) -> PathNode {
        PathNode::new(self.id.clone(), self.name.clone())
    }

    pub fn as_tag_ref(&self) -> TagRef<'_> {
        TagRef {
            id: &self.id,
            name: &self.name,
            parent_tag_id: &self.parent_tag_id,
            path: self.path.as_deref(),
        }
    }
}

impl CollectionItem for TagRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}

/// The subset of a tag the path resolver needs.
///
/// Borrowed so a path can be resolved for a tag that is not stored yet, or
/// for a stored tag under a hypothetical new parent.
#[derive(Debug, Clone, Copy)]
pub struct TagRef<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub parent_tag_id: &'a str,
    pub path: Option<&'a [PathNode]>,
}

impl<'a> TagRef<'a> {
    /// Same tag, with its cached path ignored.
    pub fn without_path(self) -> Self {
        Self { path: None, ..self }
    }

    /// Same tag, placed under another parent.
    pub fn with_parent(self, parent_tag_id: &'a str) -> Self {
        Self {
            parent_tag_id,
            path: None,
            ..self
        }
    }
}

/// Caller-supplied fields for tag creation.
///
/// Every field is optional on the wire; `create_tag` decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_tag_id: Option<String>,
}

impl TagInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            parent_tag_id: None,
        }
    }

    pub fn child_of(name: impl Into<String>, parent_tag_id: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            parent_tag_id: Some(parent_tag_id.into()),
        }
    }
}

/// Predicate over the cached `path` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatch {
    /// No path cached at all
    Missing,
    /// Any path cached
    Present,
    /// Some element has this id
    ContainsId(String),
    /// A single element has both this id and this name
    ContainsEntry(PathNode),
    /// Some element has this id but a name different from `name`
    ContainsIdWithOtherName { id: String, name: String },
}

impl PathMatch {
    pub fn matches(&self, path: Option<&[PathNode]>) -> bool {
        match (self, path) {
            (PathMatch::Missing, path) => path.is_none(),
            (_, None) => false,
            (PathMatch::Present, Some(_)) => true,
            (PathMatch::ContainsId(id), Some(path)) => path.iter().any(|n| &n.id == id),
            (PathMatch::ContainsEntry(entry), Some(path)) => path.iter().any(|n| n == entry),
            (PathMatch::ContainsIdWithOtherName { id, name }, Some(path)) => {
                path.iter().any(|n| &n.id == id && &n.name != name)
            }
        }
    }
}

/// Snapshot fields a strict selector can pin besides id and timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrictField {
    Name,
    ParentTagId,
}

/// Partial-match predicate over tag records. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSelector {
    pub id: Option<IdMatch>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub parent_tag_id: Option<IdMatch>,
    pub path: Option<PathMatch>,
}

impl TagSelector {
    /// Matches every tag.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(IdMatch::Eq(id.into())),
            ..Self::default()
        }
    }

    pub fn children_of(parent_tag_id: impl Into<String>) -> Self {
        Self {
            parent_tag_id: Some(IdMatch::Eq(parent_tag_id.into())),
            ..Self::default()
        }
    }

    pub fn non_root() -> Self {
        Self {
            parent_tag_id: Some(IdMatch::Ne(String::new())),
            ..Self::default()
        }
    }

    pub fn missing_path() -> Self {
        Self {
            path: Some(PathMatch::Missing),
            ..Self::default()
        }
    }

    /// Selector pinning a known snapshot of `tag`.
    ///
    /// Matches on id, `created_at` and `modified_at` plus the requested extra
    /// fields, so an update through it only applies while the stored record
    /// still equals the snapshot on those fields.
    pub fn strict(tag: &TagRecord, extra_fields: &[StrictField]) -> Self {
        let mut selector = Self {
            id: Some(IdMatch::Eq(tag.id.clone())),
            created_at: Some(tag.created_at),
            modified_at: Some(tag.modified_at),
            ..Self::default()
        };

        for field in extra_fields {
            match field {
                StrictField::Name => selector.name = Some(tag.name.clone()),
                StrictField::ParentTagId => {
                    selector.parent_tag_id = Some(IdMatch::Eq(tag.parent_tag_id.clone()))
                }
            }
        }

        selector
    }

    pub fn matches(&self, tag: &TagRecord) -> bool {
        self.id.as_ref().map_or(true, |m| m.matches(&tag.id))
            && self.created_at.map_or(true, |t| t == tag.created_at)
            && self.modified_at.map_or(true, |t| t == tag.modified_at)
            && self.name.as_ref().map_or(true, |n| n == &tag.name)
            && self
                .parent_tag_id
                .as_ref()
                .map_or(true, |m| m.matches(&tag.parent_tag_id))
            && self
                .path
                .as_ref()
                .map_or(true, |m| m.matches(tag.path.as_deref()))
    }
}

/// Partial-field patch for tag records. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPatch {
    pub name: Option<String>,
    pub parent_tag_id: Option<String>,
    pub path: Option<TagPath>,
    /// Rename the path element with this id (array-element patch)
    pub path_entry_name: Option<PathNode>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl TagPatch {
    /// Empty patch stamped with the current time as `modified_at`.
    pub fn touch() -> Self {
        Self {
            modified_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn parent_tag_id(mut self, parent_tag_id: impl Into<String>) -> Self {
        self.parent_tag_id = Some(parent_tag_id.into());
        self
    }

    pub fn path(mut self, path: TagPath) -> Self {
        self.path = Some(path);
        self
    }

    pub fn rename_path_entry(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.path_entry_name = Some(PathNode::new(id, name));
        self
    }

    pub fn modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.modified_at = Some(at);
        self
    }

    pub fn apply(&self, tag: &mut TagRecord) {
        if let Some(name) = &self.name {
            tag.name = name.clone();
        }
        if let Some(parent_tag_id) = &self.parent_tag_id {
            tag.parent_tag_id = parent_tag_id.clone();
        }
        if let Some(path) = &self.path {
            tag.path = Some(path.clone());
        }
        if let (Some(entry), Some(path)) = (&self.path_entry_name, tag.path.as_mut()) {
            for node in path.iter_mut().filter(|n| n.id == entry.id) {
                node.name = entry.name.clone();
            }
        }
        if let Some(at) = self.modified_at {
            tag.modified_at = at;
        }
    }
}
