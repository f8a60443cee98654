//! Tag Tree Integration Tests
//!
//! End-to-end flows through the public API: tags created, renamed, moved and
//! removed through `TagService`, checked against the stored records.
//!
//! ## Test Coverage
//! - Rename then remove a root, leaving its child detached
//! - Cascades keep every cached path consistent on a deeper tree
//! - A libsql-backed tree reloads what a previous instance wrote
//! - Sample data seeding is idempotent

#[cfg(test)]
mod tag_tree_tests {
    use anyhow::Result;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tagstock_core::db::{
        Collection, LibsqlCollection, LibsqlDatabase, MemoryCollection, SharedCollection,
    };
    use tagstock_core::models::{PathNode, TagInput, TagRecord, TagSelector};
    use tagstock_core::{seed_sample_data, ItemService, TagService, TagServiceConfig};
    use tempfile::TempDir;

    fn memory_service(fix_path: bool) -> TagService {
        TagService::new(
            Arc::new(MemoryCollection::new("tags")),
            TagServiceConfig { fix_path },
        )
    }

    async fn tag(service: &TagService, id: &str) -> Result<TagRecord> {
        service
            .get_tag(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("tag {} not found", id))
    }

    #[tokio::test]
    async fn test_rename_then_remove_leaves_child_detached() -> Result<()> {
        let service = memory_service(false);

        let a1 = service.create_tag(TagInput::named("A")).await?;
        let b1 = service.create_tag(TagInput::child_of("B", &a1)).await?;
        assert_eq!(
            tag(&service, &b1).await?.path,
            Some(vec![PathNode::new(&a1, "A"), PathNode::new(&b1, "B")])
        );

        let a = tag(&service, &a1).await?;
        assert!(service.rename_tag(&a, "A2").await?);
        assert_eq!(
            tag(&service, &b1).await?.path,
            Some(vec![PathNode::new(&a1, "A2"), PathNode::new(&b1, "B")])
        );

        assert!(service.remove_tag(&a1).await?);
        assert_eq!(service.get_detached_tags().await?, vec![b1]);

        Ok(())
    }

    #[tokio::test]
    async fn test_mixed_mutations_keep_paths_consistent() -> Result<()> {
        for fix_path in [false, true] {
            let service = memory_service(fix_path);

            let house = service.create_tag(TagInput::named("House")).await?;
            let kitchen = service.create_tag(TagInput::child_of("Kitchen", &house)).await?;
            let drawer = service.create_tag(TagInput::child_of("Drawer", &kitchen)).await?;
            let garage = service.create_tag(TagInput::named("Garage")).await?;
            let shelf = service.create_tag(TagInput::child_of("Shelf", &garage)).await?;

            service.rename_tag(&tag(&service, &kitchen).await?, "Cuisine").await?;
            service.set_tag_parent(&tag(&service, &kitchen).await?, &shelf).await?;
            service.rename_tag(&tag(&service, &garage).await?, "Workshop").await?;

            assert_eq!(
                tag(&service, &drawer).await?.path,
                Some(vec![
                    PathNode::new(&garage, "Workshop"),
                    PathNode::new(&shelf, "Shelf"),
                    PathNode::new(&kitchen, "Cuisine"),
                    PathNode::new(&drawer, "Drawer"),
                ])
            );

            for record in service.list_tags().await? {
                let resolved = service
                    .resolve_path(record.as_tag_ref().without_path(), false)
                    .await?;
                assert_eq!(record.path, Some(resolved), "fix_path={fix_path}");
            }

            let garage_tag = tag(&service, &garage).await?;
            let by_parent: HashSet<String> = service
                .get_all_descendants(&garage_tag)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();
            let by_path: HashSet<String> = service
                .get_all_descendants_by_path(&garage_tag)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();
            assert_eq!(by_parent, HashSet::from([shelf, kitchen, drawer]));
            assert_eq!(by_parent, by_path);
            assert!(tag(&service, &house).await?.is_root());
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_database_reload_keeps_tree() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("tagstock.db");

        let (root, child) = {
            let db = Arc::new(LibsqlDatabase::open(&path).await?);
            let tags: SharedCollection<TagRecord> =
                Arc::new(LibsqlCollection::open(db, "tags").await?);
            let service = TagService::new(tags, TagServiceConfig::default());

            let root = service.create_tag(TagInput::named("Attic")).await?;
            let child = service.create_tag(TagInput::child_of("Box", &root)).await?;
            service.rename_tag(&tag(&service, &root).await?, "Loft").await?;
            (root, child)
        };

        let db = Arc::new(LibsqlDatabase::open(&path).await?);
        let tags: SharedCollection<TagRecord> = Arc::new(LibsqlCollection::open(db, "tags").await?);
        let service = TagService::new(tags.clone(), TagServiceConfig::default());

        assert_eq!(tags.count(&TagSelector::all()).await?, 2);
        let reloaded = tag(&service, &child).await?;
        assert_eq!(reloaded.parent_tag_id, root);
        assert_eq!(
            reloaded.path,
            Some(vec![PathNode::new(&root, "Loft"), PathNode::new(&child, "Box")])
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_sample_data_runs_once() -> Result<()> {
        let tags = memory_service(true);
        let items = ItemService::new(Arc::new(MemoryCollection::new("items")));

        seed_sample_data(&tags, &items).await?;
        seed_sample_data(&tags, &items).await?;

        assert_eq!(items.count_items().await?, 100);
        let all_tags = tags.list_tags().await?;
        assert_eq!(all_tags.len(), 6);
        assert_eq!(all_tags.iter().filter(|t| t.is_root()).count(), 2);
        assert!(all_tags.iter().all(|t| t.path.is_some()));
        assert!(tags.get_detached_tags().await?.is_empty());

        Ok(())
    }
}
