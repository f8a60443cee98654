//! RPC dispatch and transports
//!
//! `handle_request` routes one parsed request to its handler. Two transports
//! feed it:
//!
//! - stdio: one JSON-RPC object per line on stdin, one response per line on
//!   stdout, until EOF
//! - HTTP: `POST /rpc` with a JSON-RPC body, plus `GET /health`

use crate::rpc::context::RpcContext;
use crate::rpc::handlers::{items, tags};
use crate::rpc::types::{RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION};
use axum::{
    body::Bytes,
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

/// Handle a JSON-RPC request and return a response
#[instrument(skip(ctx, request), fields(method = %request.method, id = %request.id))]
pub async fn handle_request(ctx: &RpcContext, request: RpcRequest) -> RpcResponse {
    if request.jsonrpc != JSONRPC_VERSION {
        return RpcResponse::error(
            request.id,
            RpcError::invalid_request(format!(
                "Unsupported jsonrpc version: {}",
                request.jsonrpc
            )),
        );
    }

    let params = request.params;
    let result = match request.method.as_str() {
        "createTag" => tags::handle_create_tag(ctx, params).await,
        "renameTag" => tags::handle_rename_tag(ctx, params).await,
        "setTagParent" => tags::handle_set_tag_parent(ctx, params).await,
        "removeTag" => tags::handle_remove_tag(ctx, params).await,
        "fixPath" => tags::handle_fix_path(ctx, params).await,
        "getDetachedTags" => tags::handle_get_detached_tags(ctx).await,
        "watchAndFixMissingPath" => tags::handle_watch_and_fix_missing_path(ctx).await,
        "getAllDescendants" => tags::handle_get_all_descendants(ctx, params).await,
        "getTag" => tags::handle_get_tag(ctx, params).await,
        "listTags" => tags::handle_list_tags(ctx).await,
        "createItem" => items::handle_create_item(ctx, params).await,
        "listItems" => items::handle_list_items(ctx).await,
        "updateItem" => items::handle_update_item(ctx, params).await,
        "removeItem" => items::handle_remove_item(ctx, params).await,
        method => {
            warn!("⚠️  Unknown RPC method: {}", method);
            Err(RpcError::method_not_found(method))
        }
    };

    match result {
        Ok(result) => {
            debug!("✅ RPC request {} succeeded", request.id);
            RpcResponse::success(request.id, result)
        }
        Err(error) => {
            warn!(code = error.code, "❌ RPC request {} failed: {}", request.id, error.message);
            RpcResponse::error(request.id, error)
        }
    }
}

/// Parse one raw message and handle it
///
/// Malformed JSON answers with `PARSE_ERROR` and a null id.
pub async fn handle_message(ctx: &RpcContext, message: &[u8]) -> RpcResponse {
    match serde_json::from_slice::<RpcRequest>(message) {
        Ok(request) => handle_request(ctx, request).await,
        Err(e) => {
            warn!("❌ Failed to parse JSON-RPC request: {}", e);
            RpcResponse::error(Value::Null, RpcError::parse_error(format!("Invalid JSON: {}", e)))
        }
    }
}

/// Run the stdio transport until stdin is closed
pub async fn run_stdio_server(ctx: Arc<RpcContext>) -> anyhow::Result<()> {
    info!("🔌 RPC stdio server started");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("📥 RPC request: {}", line);

        let response = handle_message(&ctx, line.as_bytes()).await;
        write_response(&mut stdout, &response).await?;
    }

    info!("🔌 RPC stdio server stopped (stdin closed)");
    Ok(())
}

/// Write one response as a single line
async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &RpcResponse,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// HTTP router exposing the RPC endpoint
pub fn router(ctx: Arc<RpcContext>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/rpc", post(rpc_endpoint))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn rpc_endpoint(State(ctx): State<Arc<RpcContext>>, body: Bytes) -> Json<RpcResponse> {
    Json(handle_message(&ctx, &body).await)
}

/// Serve the HTTP transport on `127.0.0.1:port` until the process exits
pub async fn serve_http(ctx: Arc<RpcContext>, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 RPC HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(ctx)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::types::{INVALID_REQUEST, PARSE_ERROR};
    use std::io::Cursor;

    #[tokio::test]
    async fn test_write_response_is_one_line() {
        let mut buffer = Cursor::new(Vec::new());
        let response = RpcResponse::success(Value::from(7), Value::Bool(true));

        write_response(&mut buffer, &response).await.unwrap();

        let written = String::from_utf8(buffer.into_inner()).unwrap();
        assert_eq!(written, "{\"jsonrpc\":\"2.0\",\"id\":7,\"result\":true}\n");
    }

    #[tokio::test]
    async fn test_malformed_and_wrong_version_requests() {
        let ctx = crate::rpc::test_context(false);

        let response = handle_message(&ctx, b"{not json").await;
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);

        let response = handle_message(
            &ctx,
            br#"{"jsonrpc":"1.0","id":"a","method":"listTags"}"#,
        )
        .await;
        assert_eq!(response.id, Value::from("a"));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }
}
