//! LibsqlCollection - Collection Implementation for the libsql Backend
//!
//! Durable storage for tags and items in a single embedded libsql (SQLite)
//! database file. Each collection is one table holding one JSON document per
//! row:
//!
//! ```sql
//! CREATE TABLE tags (
//!     seq INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
//!     id TEXT NOT NULL UNIQUE,
//!     data TEXT NOT NULL                      -- serialized document
//! )
//! ```
//!
//! # Write Protocol
//!
//! Every write runs in its own `BEGIN IMMEDIATE` transaction: matching
//! documents are read, patched in Rust and written back before `COMMIT`, so a
//! strict selector still behaves as compare-and-swap. Change events are
//! published only after the commit succeeded. Reads never take the writer
//! lock and see the last committed state (WAL mode).
//!
//! # Connection Pattern
//!
//! One connection per operation, opened through `LibsqlDatabase::connect`
//! which applies the busy timeout.

use super::collection::{Collection, Document, FindOptions, UpdateOptions};
use super::error::StoreError;
use super::events::{CollectionEvent, EVENT_CHANNEL_CAPACITY};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

/// Shared handle to the database file
///
/// Opened once at startup; every `LibsqlCollection` keeps an `Arc` to it.
pub struct LibsqlDatabase {
    db: Database,
    db_path: PathBuf,
}

impl LibsqlDatabase {
    /// Open (or create) the database file at `db_path`
    ///
    /// Creates the parent directory when missing and switches the database to
    /// WAL mode so readers do not wait for writers.
    pub async fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| StoreError::connection_failed(db_path.clone(), e))?;

        let database = Self { db, db_path };
        let conn = database.connect().await?;
        execute_pragma(&conn, "PRAGMA journal_mode = WAL").await?;

        tracing::info!(path = %database.db_path.display(), "📂 Opened libsql database");
        Ok(database)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// New connection with a 5s busy timeout
    pub async fn connect(&self) -> Result<Connection, StoreError> {
        let conn = self.db.connect()?;
        execute_pragma(&conn, "PRAGMA busy_timeout = 5000").await?;
        Ok(conn)
    }
}

/// PRAGMA statements return rows, so they go through `query()`
async fn execute_pragma(conn: &Connection, pragma: &str) -> Result<(), StoreError> {
    conn.query(pragma, ())
        .await
        .map_err(|e| StoreError::sql_execution(format!("Failed to execute '{}': {}", pragma, e)))?;
    Ok(())
}

/// Collection names are interpolated into SQL as table names
fn validate_collection_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollectionName(name.to_string()))
    }
}

pub struct LibsqlCollection<D: Document> {
    name: String,
    db: Arc<LibsqlDatabase>,
    /// Serializes this process's writers so they queue here instead of
    /// spinning on SQLITE_BUSY
    write_lock: Mutex<()>,
    events: broadcast::Sender<CollectionEvent<D>>,
}

impl<D: Document> LibsqlCollection<D> {
    /// Open the collection `name`, creating its table if needed
    pub async fn open(db: Arc<LibsqlDatabase>, name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        validate_collection_name(&name)?;

        let conn = db.connect().await?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    data TEXT NOT NULL
                )",
                name
            ),
            (),
        )
        .await
        .map_err(|e| {
            StoreError::sql_execution(format!("Failed to create table '{}': {}", name, e))
        })?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let collection = Self {
            name,
            db,
            write_lock: Mutex::new(()),
            events,
        };

        tracing::debug!(collection = %collection.name, "Opened libsql collection");
        Ok(collection)
    }

    fn emit(&self, event: CollectionEvent<D>) {
        tracing::trace!(collection = %self.name, event = event.event_type(), "Change event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn encode(&self, doc: &D) -> Result<String, StoreError> {
        serde_json::to_string(doc).map_err(|e| StoreError::invalid_document(&self.name, e))
    }

    /// Documents matching `selector`, in insertion order
    async fn load(&self, conn: &Connection, selector: &D::Selector) -> Result<Vec<D>, StoreError> {
        let mut rows = match D::selected_id(selector) {
            Some(id) => {
                conn.query(&format!("SELECT data FROM {} WHERE id = ?", self.name), [id])
                    .await
            }
            None => {
                conn.query(&format!("SELECT data FROM {} ORDER BY seq", self.name), ())
                    .await
            }
        }
        .map_err(|e| {
            StoreError::sql_execution(format!("Failed to query '{}': {}", self.name, e))
        })?;

        let mut documents = Vec::new();
        while let Some(row) = rows.next().await? {
            let data: String = row.get(0)?;
            let doc: D = serde_json::from_str(&data)
                .map_err(|e| StoreError::invalid_document(&self.name, e))?;
            if doc.matches(selector) {
                documents.push(doc);
            }
        }
        Ok(documents)
    }

    async fn begin(&self, conn: &Connection) -> Result<(), StoreError> {
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;
        Ok(())
    }

    /// Commit when the write succeeded, roll back otherwise
    async fn finish<T>(&self, conn: &Connection, result: Result<T, StoreError>) -> Result<T, StoreError> {
        match result {
            Ok(value) => {
                if let Err(e) = conn.execute("COMMIT", ()).await {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(StoreError::sql_execution(format!(
                        "Failed to commit transaction: {}",
                        e
                    )));
                }
                Ok(value)
            }
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn insert_row(&self, conn: &Connection, doc: &D) -> Result<(), StoreError> {
        let mut existing = conn
            .query(&format!("SELECT 1 FROM {} WHERE id = ?", self.name), [doc.id()])
            .await?;
        if existing.next().await?.is_some() {
            return Err(StoreError::duplicate_id(&self.name, doc.id()));
        }

        conn.execute(
            &format!("INSERT INTO {} (id, data) VALUES (?, ?)", self.name),
            (doc.id().to_string(), self.encode(doc)?),
        )
        .await
        .map_err(|e| StoreError::sql_execution(format!("Failed to insert document: {}", e)))?;
        Ok(())
    }

    async fn update_rows(
        &self,
        conn: &Connection,
        selector: &D::Selector,
        patch: &D::Patch,
        options: UpdateOptions,
    ) -> Result<Vec<D>, StoreError> {
        let mut matching = self.load(conn, selector).await?;
        if !options.multi {
            matching.truncate(1);
        }

        for doc in matching.iter_mut() {
            doc.apply(patch);
            conn.execute(
                &format!("UPDATE {} SET data = ? WHERE id = ?", self.name),
                (self.encode(doc)?, doc.id().to_string()),
            )
            .await
            .map_err(|e| StoreError::sql_execution(format!("Failed to update document: {}", e)))?;
        }
        Ok(matching)
    }

    async fn remove_rows(&self, conn: &Connection, selector: &D::Selector) -> Result<Vec<String>, StoreError> {
        let mut removed = Vec::new();
        for doc in self.load(conn, selector).await? {
            conn.execute(
                &format!("DELETE FROM {} WHERE id = ?", self.name),
                [doc.id()],
            )
            .await
            .map_err(|e| StoreError::sql_execution(format!("Failed to delete document: {}", e)))?;
            removed.push(doc.id().to_string());
        }
        Ok(removed)
    }
}

#[async_trait]
impl<D: Document> Collection<D> for LibsqlCollection<D> {
    fn collection_name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, mut doc: D) -> Result<String, StoreError> {
        if doc.id().is_empty() {
            doc.set_id(Uuid::new_v4().to_string());
        }
        let id = doc.id().to_string();

        let _guard = self.write_lock.lock().await;
        let conn = self.db.connect().await?;
        self.begin(&conn).await?;
        let result = self.insert_row(&conn, &doc).await;
        self.finish(&conn, result).await?;

        self.emit(CollectionEvent::Inserted(doc));
        Ok(id)
    }

    async fn find(
        &self,
        selector: &D::Selector,
        options: FindOptions,
    ) -> Result<Vec<D>, StoreError> {
        let conn = self.db.connect().await?;
        let mut found = self.load(&conn, selector).await?;
        options.sort(&mut found);
        Ok(found)
    }

    async fn find_one(&self, selector: &D::Selector) -> Result<Option<D>, StoreError> {
        let conn = self.db.connect().await?;
        Ok(self.load(&conn, selector).await?.into_iter().next())
    }

    async fn update(
        &self,
        selector: &D::Selector,
        patch: &D::Patch,
        options: UpdateOptions,
    ) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let conn = self.db.connect().await?;
        self.begin(&conn).await?;
        let result = self.update_rows(&conn, selector, patch, options).await;
        let updated = self.finish(&conn, result).await?;

        let count = updated.len() as u64;
        for doc in updated {
            self.emit(CollectionEvent::Updated(doc));
        }
        Ok(count)
    }

    async fn remove(&self, selector: &D::Selector) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let conn = self.db.connect().await?;
        self.begin(&conn).await?;
        let result = self.remove_rows(&conn, selector).await;
        let removed = self.finish(&conn, result).await?;

        let count = removed.len() as u64;
        for id in removed {
            self.emit(CollectionEvent::Removed { id });
        }
        Ok(count)
    }

    async fn count(&self, selector: &D::Selector) -> Result<u64, StoreError> {
        let conn = self.db.connect().await?;
        Ok(self.load(&conn, selector).await?.len() as u64)
    }

    fn subscribe(&self) -> broadcast::Receiver<CollectionEvent<D>> {
        self.events.subscribe()
    }
}
