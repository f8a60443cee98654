//! Inventory item RPC handlers

use super::{parse_params, to_result};
use crate::models::{InventoryItem, ItemInput};
use crate::rpc::context::RpcContext;
use crate::rpc::types::RpcError;
use serde::Deserialize;
use serde_json::{json, Value};

/// Parameters for updateItem
#[derive(Debug, Deserialize)]
pub struct UpdateItemParams {
    pub item: InventoryItem,
}

/// Parameters for removeItem
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemParams {
    pub item_id: String,
}

pub async fn handle_create_item(ctx: &RpcContext, params: Value) -> Result<Value, RpcError> {
    let input: ItemInput = parse_params(params)?;
    let item_id = ctx.items.create_item(input).await?;
    Ok(json!(item_id))
}

pub async fn handle_list_items(ctx: &RpcContext) -> Result<Value, RpcError> {
    to_result(ctx.items.list_items().await?)
}

pub async fn handle_update_item(ctx: &RpcContext, params: Value) -> Result<Value, RpcError> {
    let params: UpdateItemParams = parse_params(params)?;
    Ok(json!(ctx.items.update_item(&params.item).await?))
}

pub async fn handle_remove_item(ctx: &RpcContext, params: Value) -> Result<Value, RpcError> {
    let params: RemoveItemParams = parse_params(params)?;
    Ok(json!(ctx.items.remove_item(&params.item_id).await?))
}
