//! RPC over HTTP Integration Tests
//!
//! Sends requests through the axum router in-process with
//! `tower::ServiceExt::oneshot`; no socket is bound.

#[cfg(test)]
mod rpc_http_tests {
    use anyhow::Result;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tagstock_core::db::MemoryCollection;
    use tagstock_core::rpc::{self, types, RpcContext};
    use tagstock_core::{ItemService, TagService, TagServiceConfig};
    use tokio_test::assert_ok;
    use tower::ServiceExt;

    fn app() -> Router {
        let tags = TagService::new(
            Arc::new(MemoryCollection::new("tags")),
            TagServiceConfig::default(),
        );
        let items = ItemService::new(Arc::new(MemoryCollection::new("items")));
        rpc::router(Arc::new(RpcContext::new(Arc::new(tags), Arc::new(items))))
    }

    async fn post_rpc(app: &Router, body: impl Into<Body>) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method("POST")
            .uri("/rpc")
            .header("content-type", "application/json")
            .body(body.into())?;

        let response = app.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    fn rpc_call(id: u64, method: &str, params: Value) -> String {
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string()
    }

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await?.to_bytes();
        assert_eq!(&body[..], b"OK");
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_list_tags() -> Result<()> {
        let app = app();

        let (status, created) =
            post_rpc(&app, rpc_call(1, "createTag", json!({"name": "Garage"}))).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["id"], 1);
        let tag_id = created["result"].as_str().unwrap_or_default().to_string();
        assert!(!tag_id.is_empty());

        let (_, listed) = post_rpc(&app, rpc_call(2, "listTags", Value::Null)).await?;
        assert_eq!(listed["result"][0]["_id"], tag_id);
        assert_eq!(listed["result"][0]["parentTagId"], "");
        assert_eq!(
            listed["result"][0]["path"],
            json!([{"_id": tag_id, "name": "Garage"}])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_errors_are_json_rpc_errors() -> Result<()> {
        let app = app();

        let (status, response) = post_rpc(&app, "{ not json").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], types::PARSE_ERROR);

        let (_, response) = post_rpc(
            &app,
            rpc_call(3, "createTag", json!({"name": "x", "parentTagId": "nope"})),
        )
        .await?;
        assert_eq!(response["error"]["code"], types::RECORD_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Parent Tag not found");
        assert_eq!(response["error"]["data"], json!({"_id": "nope"}));
        assert!(response.get("result").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_detached_tags_over_http() -> Result<()> {
        let app = app();

        let (_, root) = post_rpc(&app, rpc_call(1, "createTag", json!({"name": "A"}))).await?;
        let root_id = root["result"].clone();
        let (_, child) = post_rpc(
            &app,
            rpc_call(2, "createTag", json!({"name": "B", "parentTagId": root_id})),
        )
        .await?;

        let (_, removed) =
            post_rpc(&app, rpc_call(3, "removeTag", json!({"tagId": root_id}))).await?;
        assert_eq!(removed["result"], true);

        let (_, detached) = post_rpc(&app, rpc_call(4, "getDetachedTags", json!({}))).await?;
        assert_eq!(detached["result"], json!([child["result"]]));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await;
        let response = assert_ok!(response);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
