//! TagStock Server Binary
//!
//! Opens the tag and item collections, seeds sample data into an empty
//! database, starts the path repair watcher and exposes the services as
//! JSON-RPC 2.0 operations.
//!
//! # Usage
//!
//! ```bash
//! # HTTP on 127.0.0.1:3100, in-memory storage
//! cargo run --bin tagstock-server
//!
//! # stdio transport, records stored in ./data/tagstock.db
//! TAGSTOCK_TRANSPORT=stdio TAGSTOCK_DATA_DIR=./data cargo run --bin tagstock-server
//! ```
//!
//! # Environment Variables
//!
//! - `TAGSTOCK_FIX_PATH`: repair stale ancestor paths while resolving (default: true)
//! - `TAGSTOCK_TRANSPORT`: `http` or `stdio` (default: http)
//! - `TAGSTOCK_PORT`: HTTP port (default: 3100)
//! - `TAGSTOCK_DATA_DIR`: directory of the libsql database; unset keeps everything in memory
//! - `TAGSTOCK_SEED`: seed sample data into empty collections (default: true)
//! - `RUST_LOG`: logging level (e.g., "info", "debug", "trace")

use std::sync::Arc;

use tagstock_core::db::{
    Document, LibsqlCollection, LibsqlDatabase, MemoryCollection, SharedCollection,
};
use tagstock_core::rpc::{self, RpcContext};
use tagstock_core::{seed_sample_data, AppConfig, ItemService, TagService, Transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays free for the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    config.validate()?;

    tracing::info!(
        transport = ?config.transport,
        fix_path = config.fix_path,
        data_dir = ?config.data_dir,
        "🚀 Starting TagStock server"
    );

    let database = match config.database_path() {
        Some(path) => Some(Arc::new(LibsqlDatabase::open(path).await?)),
        None => None,
    };
    let tags = open_collection(database.as_ref(), "tags").await?;
    let items = open_collection(database.as_ref(), "items").await?;

    let tag_service = Arc::new(TagService::new(tags, config.tag_service_config()));
    let item_service = Arc::new(ItemService::new(items));

    if config.seed_sample_data {
        seed_sample_data(&tag_service, &item_service).await?;
    }

    let ctx = Arc::new(RpcContext::new(tag_service, item_service));

    if let Err(e) = ctx.ensure_watcher().await {
        tracing::warn!("❌ Failed to start path repair watcher: {}", e);
    }

    let result = match config.transport {
        Transport::Http => rpc::serve_http(ctx.clone(), config.port).await,
        Transport::Stdio => rpc::run_stdio_server(ctx.clone()).await,
    };

    ctx.shutdown().await;
    result
}

async fn open_collection<D: Document>(
    database: Option<&Arc<LibsqlDatabase>>,
    name: &str,
) -> anyhow::Result<SharedCollection<D>> {
    let collection: SharedCollection<D> = match database {
        Some(db) => Arc::new(LibsqlCollection::open(db.clone(), name).await?),
        None => {
            tracing::warn!(
                collection = name,
                "⚠️ No data directory configured, records are kept in memory only"
            );
            Arc::new(MemoryCollection::new(name))
        }
    };
    Ok(collection)
}
