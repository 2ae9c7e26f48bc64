//! # REST API Routes
//!
//! Axum routes for collection CRUD and search.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query,
    },
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::store::Document;

use super::errors::{RestError, RestResult};
use super::handler::{CollectionHandle, CollectionResolver};
use super::response::MessageResponse;

/// Shared state for REST handlers
pub struct RestState {
    pub resolver: CollectionResolver,
}

impl RestState {
    pub fn new(resolver: CollectionResolver) -> Self {
        Self { resolver }
    }
}

/// `/{name}/{id}` path parameters
#[derive(Debug, Deserialize)]
pub struct DocumentPath {
    pub name: String,
    pub id: String,
}

/// Search query string
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

/// Create collection and search routes
pub fn collection_routes(state: Arc<RestState>) -> Router {
    Router::new()
        .route(
            "/collection/{name}",
            get(list_handler).post(insert_handler),
        )
        .route(
            "/collection/{name}/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/search/{name}", get(search_handler))
        .with_state(state)
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> RestResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| RestError::InvalidBody(rejection.body_text()))
}

/// List all documents
async fn list_handler(collection: CollectionHandle) -> RestResult<Json<Vec<Document>>> {
    Ok(Json(collection.list().await?))
}

/// Insert one document or an array of documents
async fn insert_handler(
    collection: CollectionHandle,
    body: Result<Json<Value>, JsonRejection>,
) -> RestResult<Json<Vec<Document>>> {
    let body = json_body(body)?;
    Ok(Json(collection.insert(body).await?))
}

/// Get a document by id, `null` when absent
async fn get_handler(
    collection: CollectionHandle,
    Path(path): Path<DocumentPath>,
) -> RestResult<Json<Option<Document>>> {
    Ok(Json(collection.get(&path.id).await?))
}

/// Merge-patch a document by id
async fn update_handler(
    collection: CollectionHandle,
    Path(path): Path<DocumentPath>,
    body: Result<Json<Value>, JsonRejection>,
) -> RestResult<Json<MessageResponse>> {
    let body = json_body(body)?;
    let outcome = collection.update(&path.id, body).await?;
    Ok(Json(MessageResponse::from_outcome(outcome)))
}

/// Delete a document by id
async fn delete_handler(
    collection: CollectionHandle,
    Path(path): Path<DocumentPath>,
) -> RestResult<Json<MessageResponse>> {
    let outcome = collection.delete(&path.id).await?;
    Ok(Json(MessageResponse::from_outcome(outcome)))
}

/// Substring search over the configured fields
async fn search_handler(
    collection: CollectionHandle,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> RestResult<Json<Vec<Document>>> {
    let Query(params) =
        params.map_err(|rejection| RestError::InvalidQuery(rejection.body_text()))?;
    Ok(Json(collection.search(&params.query).await?))
}
