//! Path Repair Watcher Integration Tests
//!
//! The watcher runs in the background, so every assertion polls the store
//! until the expected repair shows up or a timeout expires.

#[cfg(test)]
mod path_repair_tests {
    use anyhow::Result;
    use std::sync::Arc;
    use std::time::Duration;
    use tagstock_core::db::{
        Collection, LibsqlCollection, LibsqlDatabase, MemoryCollection, SharedCollection,
    };
    use tagstock_core::models::{PathNode, TagPath, TagRecord};
    use tagstock_core::{PathRepairWatcher, TagService, TagServiceConfig};
    use tempfile::TempDir;

    const REPAIR_TIMEOUT: Duration = Duration::from_secs(2);

    fn setup() -> (Arc<TagService>, SharedCollection<TagRecord>) {
        let tags: SharedCollection<TagRecord> = Arc::new(MemoryCollection::new("tags"));
        let service = Arc::new(TagService::new(tags.clone(), TagServiceConfig { fix_path: true }));
        (service, tags)
    }

    /// Insert a tag the way a legacy writer would: without a path
    async fn insert_without_path(
        tags: &SharedCollection<TagRecord>,
        id: &str,
        name: &str,
        parent_tag_id: &str,
    ) -> Result<()> {
        let mut tag = TagRecord::new(name.to_string(), parent_tag_id.to_string());
        tag.id = id.to_string();
        tags.insert(tag).await?;
        Ok(())
    }

    /// Poll until the stored path of `id` equals `expected`
    async fn wait_for_path(service: &TagService, id: &str, expected: &TagPath) -> bool {
        let poll = async {
            loop {
                if let Ok(Some(tag)) = service.get_tag(id).await {
                    if tag.path.as_ref() == Some(expected) {
                        return;
                    }
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(REPAIR_TIMEOUT, poll).await.is_ok()
    }

    #[tokio::test]
    async fn test_repairs_existing_and_new_tags() -> Result<()> {
        let (service, tags) = setup();
        insert_without_path(&tags, "root", "Root", "").await?;

        let watcher = PathRepairWatcher::start(service.clone()).await?;
        assert!(wait_for_path(&service, "root", &vec![PathNode::new("root", "Root")]).await);

        insert_without_path(&tags, "child", "Child", "root").await?;
        assert!(
            wait_for_path(
                &service,
                "child",
                &vec![PathNode::new("root", "Root"), PathNode::new("child", "Child")]
            )
            .await
        );

        watcher.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_repair_does_not_stop_watch() -> Result<()> {
        let (service, tags) = setup();
        let watcher = PathRepairWatcher::start(service.clone()).await?;

        // Parent does not exist: the repair fails and is only logged
        insert_without_path(&tags, "orphan", "Orphan", "missing").await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(watcher.is_running());

        insert_without_path(&tags, "root", "Root", "").await?;
        assert!(wait_for_path(&service, "root", &vec![PathNode::new("root", "Root")]).await);

        let orphan = service.get_tag("orphan").await?;
        assert!(orphan.is_some_and(|t| t.path.is_none()));

        watcher.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_stops_repairs() -> Result<()> {
        let (service, tags) = setup();
        let watcher = PathRepairWatcher::start(service.clone()).await?;
        assert!(watcher.is_running());

        watcher.shutdown().await;

        insert_without_path(&tags, "late", "Late", "").await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        let late = service.get_tag("late").await?;
        assert!(late.is_some_and(|t| t.path.is_none()));

        Ok(())
    }

    #[tokio::test]
    async fn test_repairs_tags_stored_in_libsql() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let db = Arc::new(LibsqlDatabase::open(temp_dir.path().join("tagstock.db")).await?);
        let tags: SharedCollection<TagRecord> = Arc::new(LibsqlCollection::open(db, "tags").await?);
        let service = Arc::new(TagService::new(tags.clone(), TagServiceConfig { fix_path: true }));

        insert_without_path(&tags, "root", "Root", "").await?;
        let watcher = PathRepairWatcher::start(service.clone()).await?;

        insert_without_path(&tags, "child", "Child", "root").await?;
        assert!(
            wait_for_path(
                &service,
                "child",
                &vec![PathNode::new("root", "Root"), PathNode::new("child", "Child")]
            )
            .await
        );
        assert!(wait_for_path(&service, "root", &vec![PathNode::new("root", "Root")]).await);

        watcher.shutdown().await;
        Ok(())
    }
}
