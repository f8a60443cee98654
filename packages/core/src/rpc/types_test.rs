//! Tests for RPC types module
//!
//! Verifies JSON-RPC 2.0 request/response parsing and error mapping.

#[cfg(test)]
mod tests {
    use crate::models::ValidationError;
    use crate::rpc::types::{
        RpcError, RpcRequest, RpcResponse, CIRCULAR_REFERENCE, INTERNAL_ERROR, INVALID_PARAMS,
        INVALID_REQUEST, METHOD_NOT_FOUND, NOT_IMPLEMENTED, PARSE_ERROR, RECORD_NOT_FOUND,
        VALIDATION_ERROR,
    };
    use crate::services::ServiceError;
    use serde_json::json;

    #[test]
    fn test_parse_valid_request() {
        let json_str = r#"{
            "jsonrpc": "2.0",
            "id": 123,
            "method": "createTag",
            "params": {"name": "Garage"}
        }"#;

        let request: RpcRequest = serde_json::from_str(json_str).unwrap();

        assert_eq!(request.jsonrpc, "2.0");
        assert_eq!(request.id, json!(123));
        assert_eq!(request.method, "createTag");
        assert_eq!(request.params["name"], "Garage");
    }

    #[test]
    fn test_parse_request_with_string_id_and_no_params() {
        let request: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc": "2.0", "id": "abc", "method": "listTags"}"#)
                .unwrap();

        assert_eq!(request.id, json!("abc"));
        assert!(request.params.is_null());
    }

    #[test]
    fn test_parse_request_missing_jsonrpc() {
        let result: Result<RpcRequest, _> =
            serde_json::from_str(r#"{"id": 1, "method": "listTags"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_success_response() {
        let response = RpcResponse::success(json!(42), json!("tag-id"));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 42);
        assert_eq!(json["result"], "tag-id");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_serialize_error_response() {
        let response = RpcResponse::error(json!(99), RpcError::method_not_found("nope"));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(json["error"]["message"], "Method not found: nope");
        assert!(json["error"].get("data").is_none());
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_error_codes_constants() {
        // Standard JSON-RPC error codes
        assert_eq!(PARSE_ERROR, -32700);
        assert_eq!(INVALID_REQUEST, -32600);
        assert_eq!(METHOD_NOT_FOUND, -32601);
        assert_eq!(INVALID_PARAMS, -32602);
        assert_eq!(INTERNAL_ERROR, -32603);

        // Application codes
        assert_eq!(VALIDATION_ERROR, -32001);
        assert_eq!(RECORD_NOT_FOUND, -32002);
        assert_eq!(CIRCULAR_REFERENCE, -32003);
        assert_eq!(NOT_IMPLEMENTED, -32004);
    }

    #[test]
    fn test_service_error_mapping() {
        let err: RpcError = ServiceError::from(ValidationError::MissingName { entity: "Tag" }).into();
        assert_eq!(err.code, VALIDATION_ERROR);
        assert_eq!(err.message, "Tag must have a name.");
        assert!(err.data.is_none());

        let err: RpcError =
            ServiceError::record_not_found("Parent Tag not found", json!({"_id": "p"})).into();
        assert_eq!(err.code, RECORD_NOT_FOUND);
        assert_eq!(err.message, "Parent Tag not found");
        assert_eq!(err.data, Some(json!({"_id": "p"})));

        let err: RpcError = ServiceError::circular_reference("loop").into();
        assert_eq!(err.code, CIRCULAR_REFERENCE);

        let err: RpcError = ServiceError::NotImplemented("removeItem").into();
        assert_eq!(err.code, NOT_IMPLEMENTED);
    }
}
