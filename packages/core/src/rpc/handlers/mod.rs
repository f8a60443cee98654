//! RPC Request Handlers
//!
//! One module per record type. Each handler parses its params, calls the
//! service, and serializes the result; service errors convert into
//! `RpcError` through `From<ServiceError>`.

pub mod items;
pub mod tags;

use crate::rpc::types::RpcError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Deserialize method params; absent params count as an empty object
pub(crate) fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };

    serde_json::from_value(params)
        .map_err(|e| RpcError::invalid_params(format!("Invalid parameters: {}", e)))
}

pub(crate) fn to_result<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value)
        .map_err(|e| RpcError::internal_error(format!("Failed to serialize result: {}", e)))
}
