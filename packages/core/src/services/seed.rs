//! Sample data for an empty database

use super::error::ServiceError;
use super::item_service::ItemService;
use super::tag_service::TagService;
use crate::models::{ItemInput, TagInput, TagSelector};
use tracing::info;

const SAMPLE_ITEM_COUNT: usize = 100;

/// Fill empty collections with sample records
///
/// Each collection is only seeded when it holds no records at all, so this
/// is safe to run on every startup.
pub async fn seed_sample_data(tags: &TagService, items: &ItemService) -> Result<(), ServiceError> {
    if items.count_items().await? == 0 {
        for i in 0..SAMPLE_ITEM_COUNT {
            items
                .create_item(ItemInput {
                    name: Some(format!("Sample item {}", i + 1)),
                })
                .await?;
        }
        info!("🌱 Seeded {} sample items", SAMPLE_ITEM_COUNT);
    }

    if tags.collection().count(&TagSelector::all()).await? == 0 {
        let tag1_id = tags.create_tag(TagInput::named("Sample tag 1")).await?;
        let tag2_id = tags.create_tag(TagInput::named("Sample tag 2")).await?;
        tags.create_tag(TagInput::child_of("Sample child tag 1-1", &tag1_id))
            .await?;
        tags.create_tag(TagInput::child_of("Sample child tag 1-2", &tag1_id))
            .await?;
        tags.create_tag(TagInput::child_of("Sample child tag 2-1", &tag2_id))
            .await?;
        tags.create_tag(TagInput::child_of("Sample child tag 2-2", &tag2_id))
            .await?;
        info!("🌱 Seeded sample tag tree");
    }

    Ok(())
}
