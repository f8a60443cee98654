//! Remote Operation Layer (JSON-RPC 2.0)
//!
//! Exposes the tag and item services as named remote operations. Requests
//! and responses follow JSON-RPC 2.0; method names and params use camelCase
//! and records are serialized in their stored form (`_id`, `parentTagId`,
//! `createdAt`, ...).
//!
//! # Usage
//!
//! ```json
//! {
//!   "jsonrpc": "2.0",
//!   "id": 1,
//!   "method": "createTag",
//!   "params": { "name": "Garage", "parentTagId": "" }
//! }
//! ```
//!
//! Service failures become JSON-RPC errors; a missing record carries the
//! failed selector in `error.data`.

pub mod context;
pub mod handlers;
pub mod server;
pub mod types;

#[cfg(test)]
mod types_test;


pub use context::RpcContext;
pub use server::{handle_message, handle_request, router, run_stdio_server, serve_http};
pub use types::{RpcError, RpcRequest, RpcResponse};

#[cfg(test)]
pub(crate) fn test_context(fix_path: bool) -> RpcContext {
    use crate::db::MemoryCollection;
    use crate::services::{ItemService, TagService, TagServiceConfig};
    use std::sync::Arc;

    let tags = TagService::new(
        Arc::new(MemoryCollection::new("tags")),
        TagServiceConfig { fix_path },
    );
    let items = ItemService::new(Arc::new(MemoryCollection::new("items")));
    RpcContext::new(Arc::new(tags), Arc::new(items))
}
