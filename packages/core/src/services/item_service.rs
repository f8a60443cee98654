//! Item Service - Inventory Item Operations
//!
//! Items are flat records with no structural invariants. Only creation and
//! listing are implemented; update and removal are exposed remotely but
//! answer with `ServiceError::NotImplemented`.

use crate::db::{FindOptions, SharedCollection, SortField};
use crate::models::{InventoryItem, ItemInput, ItemSelector, ValidationError};
use crate::services::error::ServiceError;
use tracing::{debug, instrument};

pub struct ItemService {
    items: SharedCollection<InventoryItem>,
}

impl ItemService {
    pub fn new(items: SharedCollection<InventoryItem>) -> Self {
        Self { items }
    }

    /// Create an item and return its id
    ///
    /// # Errors
    ///
    /// `Validation` ("Item must have a name.") when `name` is absent or empty.
    #[instrument(skip(self, input), fields(name = ?input.name))]
    pub async fn create_item(&self, input: ItemInput) -> Result<String, ServiceError> {
        let name = input
            .name
            .filter(|name| !name.is_empty())
            .ok_or(ValidationError::MissingName { entity: "Item" })?;

        let item_id = self.items.insert(InventoryItem::new(name)).await?;
        debug!(item_id = %item_id, "Created item");

        Ok(item_id)
    }

    /// All items, oldest first
    pub async fn list_items(&self) -> Result<Vec<InventoryItem>, ServiceError> {
        Ok(self
            .items
            .find(&ItemSelector::all(), FindOptions::sorted_by(SortField::CreatedAt))
            .await?)
    }

    pub async fn count_items(&self) -> Result<u64, ServiceError> {
        Ok(self.items.count(&ItemSelector::all()).await?)
    }

    pub async fn update_item(&self, _item: &InventoryItem) -> Result<bool, ServiceError> {
        Err(ServiceError::NotImplemented("updateItem"))
    }

    pub async fn remove_item(&self, _item_id: &str) -> Result<bool, ServiceError> {
        Err(ServiceError::NotImplemented("removeItem"))
    }
}
