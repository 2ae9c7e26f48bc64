//! # Collection Handles
//!
//! Resolves the collection named in a request path into a handle bound to the
//! document store, and translates each REST operation into one store call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use serde_json::Value;

use crate::store::{
    Document, DocumentId, DocumentStore, SearchQuery, StoreResult, WriteOutcome, ID_FIELD,
};

use super::errors::{RestError, RestResult};
use super::policy::CollectionPolicy;
use super::server::RestState;

/// Path parameter carrying the collection name
pub const COLLECTION_PARAM: &str = "name";

/// Binds collection names to handles on the configured store
#[derive(Clone)]
pub struct CollectionResolver {
    store: Arc<dyn DocumentStore>,
    policy: Arc<CollectionPolicy>,
    search_fields: Arc<[String]>,
    timeout: Duration,
}

impl CollectionResolver {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        policy: CollectionPolicy,
        search_fields: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            policy: Arc::new(policy),
            search_fields: search_fields.into(),
            timeout,
        }
    }

    /// Validate `name` and bind a handle to it
    pub fn resolve(&self, name: &str) -> RestResult<CollectionHandle> {
        self.policy.check(name)?;
        tracing::debug!(collection = name, "collection resolved");

        Ok(CollectionHandle {
            name: name.to_string(),
            store: Arc::clone(&self.store),
            search_fields: Arc::clone(&self.search_fields),
            timeout: self.timeout,
        })
    }
}

/// A collection bound for the duration of one request
#[derive(Clone)]
pub struct CollectionHandle {
    name: String,
    store: Arc<dyn DocumentStore>,
    search_fields: Arc<[String]>,
    timeout: Duration,
}

impl FromRequestParts<Arc<RestState>> for CollectionHandle {
    type Rejection = RestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<RestState>,
    ) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| RestError::InvalidPath(e.body_text()))?;

        let name = params
            .get(COLLECTION_PARAM)
            .ok_or_else(|| RestError::InvalidPath("missing collection name".to_string()))?;

        state.resolver.resolve(name)
    }
}

impl CollectionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All documents of the collection
    pub async fn list(&self) -> RestResult<Vec<Document>> {
        let docs = self.bounded(self.store.find_all(&self.name)).await?;
        tracing::debug!(collection = %self.name, count = docs.len(), "documents listed");
        Ok(docs)
    }

    /// Insert one document or an array of documents
    pub async fn insert(&self, body: Value) -> RestResult<Vec<Document>> {
        let documents = insert_documents(body)?;
        let inserted = self.bounded(self.store.insert(&self.name, documents)).await?;
        tracing::info!(collection = %self.name, count = inserted.len(), "documents inserted");
        Ok(inserted)
    }

    /// The document with the given id, if any
    pub async fn get(&self, id: &str) -> RestResult<Option<Document>> {
        let id = parse_id(id)?;
        self.bounded(self.store.find_by_id(&self.name, &id)).await
    }

    /// Merge `body` into the document with the given id
    pub async fn update(&self, id: &str, body: Value) -> RestResult<WriteOutcome> {
        let id = parse_id(id)?;
        let patch = patch_document(body)?;
        let outcome = self
            .bounded(self.store.update_by_id(&self.name, &id, patch))
            .await?;

        tracing::info!(
            collection = %self.name,
            id = %id,
            matched = outcome.matched,
            "document update"
        );
        Ok(outcome)
    }

    /// Delete the document with the given id
    pub async fn delete(&self, id: &str) -> RestResult<WriteOutcome> {
        let id = parse_id(id)?;
        let outcome = self.bounded(self.store.delete_by_id(&self.name, &id)).await?;

        tracing::info!(
            collection = %self.name,
            id = %id,
            deleted = outcome.matched,
            "document delete"
        );
        Ok(outcome)
    }

    /// Case-insensitive substring search over the configured fields
    pub async fn search(&self, text: &str) -> RestResult<Vec<Document>> {
        let query = SearchQuery::new(text, self.search_fields.to_vec())?;

        let docs = if query.matches_everything() {
            self.bounded(self.store.find_all(&self.name)).await?
        } else {
            self.bounded(self.store.search(&self.name, &query)).await?
        };

        tracing::debug!(
            collection = %self.name,
            query = text,
            count = docs.len(),
            "search complete"
        );
        Ok(docs)
    }

    async fn bounded<T>(&self, call: impl Future<Output = StoreResult<T>>) -> RestResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RestError::StoreTimeout(self.timeout.as_millis() as u64)),
        }
    }
}

fn parse_id(id: &str) -> RestResult<DocumentId> {
    id.parse()
        .map_err(|_| RestError::InvalidId(id.to_string()))
}

/// Fields clients may not set directly
fn check_fields(doc: &Document) -> RestResult<()> {
    if doc.contains_key(ID_FIELD) {
        return Err(RestError::InvalidBody(format!(
            "'{ID_FIELD}' is assigned by the store"
        )));
    }
    if let Some(key) = doc.keys().find(|k| k.starts_with('$')) {
        return Err(RestError::InvalidBody(format!(
            "field names may not start with '$': {key}"
        )));
    }
    Ok(())
}

fn insert_documents(body: Value) -> RestResult<Vec<Document>> {
    let documents = match body {
        Value::Object(doc) => vec![doc],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(doc) => Ok(doc),
                _ => Err(RestError::InvalidBody(
                    "array items must be JSON objects".to_string(),
                )),
            })
            .collect::<RestResult<Vec<_>>>()?,
        _ => {
            return Err(RestError::InvalidBody(
                "expected a JSON object or an array of objects".to_string(),
            ))
        }
    };

    if documents.is_empty() {
        return Err(RestError::InvalidBody("nothing to insert".to_string()));
    }
    for doc in &documents {
        check_fields(doc)?;
    }

    Ok(documents)
}

fn patch_document(body: Value) -> RestResult<Document> {
    let Value::Object(patch) = body else {
        return Err(RestError::InvalidBody("expected a JSON object".to_string()));
    };

    if patch.is_empty() {
        return Err(RestError::InvalidBody("update has no fields".to_string()));
    }
    check_fields(&patch)?;
    if let Some(key) = patch.keys().find(|k| k.split('.').any(str::is_empty)) {
        return Err(RestError::InvalidBody(format!(
            "update path has an empty segment: '{key}'"
        )));
    }

    Ok(patch)
}
