//! Tag tree RPC handlers
//!
//! Mutators that rely on optimistic concurrency (`renameTag`, `setTagParent`,
//! `fixPath`) take the caller's full tag snapshot, not just an id: the write
//! only applies while the stored record still matches it.

use super::{parse_params, to_result};
use crate::models::{TagInput, TagRecord};
use crate::rpc::context::RpcContext;
use crate::rpc::types::RpcError;
use crate::services::ServiceError;
use serde::Deserialize;
use serde_json::{json, Value};

/// Parameters for renameTag
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTagParams {
    pub tag: TagRecord,
    pub new_name: String,
}

/// Parameters for setTagParent
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTagParentParams {
    pub tag: TagRecord,
    #[serde(default)]
    pub parent_tag_id: String,
}

/// Parameters for fixPath
#[derive(Debug, Deserialize)]
pub struct FixPathParams {
    pub tag: TagRecord,
}

/// Parameters for methods addressing one tag by id
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagIdParams {
    pub tag_id: String,
}

/// Parameters for getAllDescendants
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAllDescendantsParams {
    pub tag_id: String,
    /// Use the single-query path lookup instead of the parent walk
    #[serde(default)]
    pub by_path: bool,
}

pub async fn handle_create_tag(ctx: &RpcContext, params: Value) -> Result<Value, RpcError> {
    let input: TagInput = parse_params(params)?;
    let tag_id = ctx.tags.create_tag(input).await?;
    Ok(json!(tag_id))
}

pub async fn handle_rename_tag(ctx: &RpcContext, params: Value) -> Result<Value, RpcError> {
    let params: RenameTagParams = parse_params(params)?;
    let renamed = ctx.tags.rename_tag(&params.tag, &params.new_name).await?;
    Ok(json!(renamed))
}

pub async fn handle_set_tag_parent(ctx: &RpcContext, params: Value) -> Result<Value, RpcError> {
    let params: SetTagParentParams = parse_params(params)?;
    let updated = ctx
        .tags
        .set_tag_parent(&params.tag, &params.parent_tag_id)
        .await?;
    Ok(json!(updated))
}

pub async fn handle_remove_tag(ctx: &RpcContext, params: Value) -> Result<Value, RpcError> {
    let params: TagIdParams = parse_params(params)?;
    let removed = ctx.tags.remove_tag(&params.tag_id).await?;
    Ok(json!(removed))
}

pub async fn handle_fix_path(ctx: &RpcContext, params: Value) -> Result<Value, RpcError> {
    let params: FixPathParams = parse_params(params)?;
    let updated = ctx.tags.fix_path(&params.tag).await?;
    Ok(json!(updated))
}

pub async fn handle_get_detached_tags(ctx: &RpcContext) -> Result<Value, RpcError> {
    to_result(ctx.tags.get_detached_tags().await?)
}

/// Start the path repair watcher; calling it again is a no-op
pub async fn handle_watch_and_fix_missing_path(ctx: &RpcContext) -> Result<Value, RpcError> {
    let started = ctx.ensure_watcher().await?;
    tracing::debug!(started, "watchAndFixMissingPath");
    Ok(json!(true))
}

pub async fn handle_get_all_descendants(
    ctx: &RpcContext,
    params: Value,
) -> Result<Value, RpcError> {
    let params: GetAllDescendantsParams = parse_params(params)?;

    let tag = ctx.tags.get_tag(&params.tag_id).await?.ok_or_else(|| {
        ServiceError::record_not_found("Tag not found", json!({ "_id": params.tag_id }))
    })?;

    let descendants = if params.by_path {
        ctx.tags.get_all_descendants_by_path(&tag).await?
    } else {
        ctx.tags.get_all_descendants(&tag).await?
    };

    to_result(descendants)
}

pub async fn handle_get_tag(ctx: &RpcContext, params: Value) -> Result<Value, RpcError> {
    let params: TagIdParams = parse_params(params)?;
    to_result(ctx.tags.get_tag(&params.tag_id).await?)
}

pub async fn handle_list_tags(ctx: &RpcContext) -> Result<Value, RpcError> {
    to_result(ctx.tags.list_tags().await?)
}
