//! Inventory items: a flat entity with no structural relationships.

use super::collection_item::{CollectionItem, IdMatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(rename = "_id")]
    pub id: String,

    /// Name of the inventory item
    pub name: String,

    pub created_at: DateTime<Utc>,

    pub modified_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name,
            created_at: now,
            modified_at: now,
        }
    }
}

impl CollectionItem for InventoryItem {
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemSelector {
    pub id: Option<IdMatch>,
    pub name: Option<String>,
}

impl ItemSelector {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(IdMatch::Eq(id.into())),
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &InventoryItem) -> bool {
        self.id.as_ref().map_or(true, |m| m.matches(&item.id))
            && self.name.as_ref().map_or(true, |n| n == &item.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl ItemPatch {
    pub fn apply(&self, item: &mut InventoryItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(at) = self.modified_at {
            item.modified_at = at;
        }
    }
}
