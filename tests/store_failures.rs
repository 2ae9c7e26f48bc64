//! Store Failure Tests
//!
//! Store errors and stalls must surface as distinct, structured responses:
//! - backend failures are opaque 500s
//! - stalled calls are cut off with 504
//! - neither is confused with a zero-match write result

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use collection_gateway::http_server::{GatewayConfig, HttpServer};
use collection_gateway::store::{
    Document, DocumentId, DocumentStore, SearchQuery, StoreError, StoreResult, WriteOutcome,
};

/// How the stub store misbehaves
#[derive(Clone, Copy)]
enum Behavior {
    Fail,
    Stall,
}

struct BrokenStore {
    behavior: Behavior,
}

impl BrokenStore {
    async fn misbehave<T>(&self) -> StoreResult<T> {
        match self.behavior {
            Behavior::Fail => Err(StoreError::Backend("connection reset by peer".to_string())),
            Behavior::Stall => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(StoreError::Backend("unreachable".to_string()))
            }
        }
    }
}

#[async_trait]
impl DocumentStore for BrokenStore {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.misbehave().await
    }

    async fn find_all(&self, _collection: &str) -> StoreResult<Vec<Document>> {
        self.misbehave().await
    }

    async fn insert(&self, _collection: &str, _documents: Vec<Document>) -> StoreResult<Vec<Document>> {
        self.misbehave().await
    }

    async fn find_by_id(&self, _collection: &str, _id: &DocumentId) -> StoreResult<Option<Document>> {
        self.misbehave().await
    }

    async fn update_by_id(
        &self,
        _collection: &str,
        _id: &DocumentId,
        _patch: Document,
    ) -> StoreResult<WriteOutcome> {
        self.misbehave().await
    }

    async fn delete_by_id(&self, _collection: &str, _id: &DocumentId) -> StoreResult<WriteOutcome> {
        self.misbehave().await
    }

    async fn search(&self, _collection: &str, _query: &SearchQuery) -> StoreResult<Vec<Document>> {
        self.misbehave().await
    }
}

fn gateway(behavior: Behavior) -> Router {
    let config = GatewayConfig {
        store_timeout_ms: 50,
        ..GatewayConfig::for_store("memory://")
    };
    HttpServer::new(config, Arc::new(BrokenStore { behavior })).router()
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Backend failures are reported as opaque server errors on every route.
#[tokio::test]
async fn test_backend_failure_is_opaque_500() {
    let router = gateway(Behavior::Fail);
    let id = "507f1f77bcf86cd799439011";

    let cases = [
        (Method::GET, "/collection/items".to_string(), None),
        (Method::POST, "/collection/items".to_string(), Some(r#"{"a":1}"#)),
        (Method::GET, format!("/collection/items/{id}"), None),
        (Method::PUT, format!("/collection/items/{id}"), Some(r#"{"a":1}"#)),
        (Method::DELETE, format!("/collection/items/{id}"), None),
        (Method::GET, "/search/items?query=x".to_string(), None),
    ];

    for (method, uri, body) in cases {
        let (status, response) = send(&router, method.clone(), &uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert_eq!(response["kind"], "store");
        assert_eq!(response["error"], "document store error");
        assert!(response.get("msg").is_none());
    }
}

/// Stalled store calls are cut off by the configured timeout.
#[tokio::test]
async fn test_stalled_store_times_out() {
    let router = gateway(Behavior::Stall);

    let (status, response) = send(&router, Method::GET, "/collection/items", None).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(response["kind"], "store_timeout");
    assert_eq!(response["code"], 504);
}

/// Health degrades instead of failing when the store is unreachable.
#[tokio::test]
async fn test_health_reports_unavailable() {
    let router = gateway(Behavior::Fail);
    let (status, response) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response["status"], "unavailable");
    assert_eq!(response["store"], "broken");
}

/// Client errors are detected before the store is ever called.
#[tokio::test]
async fn test_client_errors_do_not_reach_store() {
    let router = gateway(Behavior::Stall);
    let (status, response) = send(&router, Method::GET, "/collection/items/bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["kind"], "invalid_id");
}
