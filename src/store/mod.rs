//! # Document Store
//!
//! Data-access layer of the gateway. Every HTTP operation maps onto exactly
//! one call of [`DocumentStore`]; backends are selected from the connection
//! string at startup.
//!
//! # Backends
//!
//! - `mongodb://`, `mongodb+srv://` - [`MongoStore`]
//! - `memory://` - [`MemoryStore`]

pub mod errors;
pub mod id;
pub mod memory;
pub mod mongo;
pub mod search;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use errors::{StoreError, StoreResult};
pub use id::DocumentId;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use search::SearchQuery;

/// Name of the identifier field carried by every stored document
pub const ID_FIELD: &str = "_id";

/// A schema-less document as exchanged with clients
pub type Document = Map<String, Value>;

/// Outcome of an id-targeted write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Number of documents the filter matched
    pub matched: u64,
}

impl WriteOutcome {
    pub fn new(matched: u64) -> Self {
        Self { matched }
    }

    /// True when exactly one document was targeted
    pub fn is_single(&self) -> bool {
        self.matched == 1
    }
}

/// Collection-scoped operations of a document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Round-trip to the store to prove it is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Fetch every document of a collection, in natural order
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Insert documents, assigning identifiers. Returns the stored documents.
    async fn insert(&self, collection: &str, documents: Vec<Document>)
        -> StoreResult<Vec<Document>>;

    /// Fetch the document with the given identifier
    async fn find_by_id(&self, collection: &str, id: &DocumentId)
        -> StoreResult<Option<Document>>;

    /// Apply `patch` as a `$set` to the document with the given identifier
    async fn update_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: Document,
    ) -> StoreResult<WriteOutcome>;

    /// Delete the document with the given identifier
    async fn delete_by_id(&self, collection: &str, id: &DocumentId) -> StoreResult<WriteOutcome>;

    /// Fetch the documents matching a search query
    async fn search(&self, collection: &str, query: &SearchQuery) -> StoreResult<Vec<Document>>;
}

/// Connect to the store named by `uri`.
///
/// Returns only once the store has answered a ping, so callers never serve
/// requests against a half-initialized connection.
pub async fn connect(uri: &str, database: Option<&str>) -> StoreResult<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = if uri.starts_with(memory::SCHEME) {
        Arc::new(MemoryStore::new())
    } else if uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://") {
        let database = database.ok_or(StoreError::MissingDatabase)?;
        Arc::new(MongoStore::connect(uri, database).await?)
    } else {
        let scheme = uri.split("://").next().unwrap_or(uri);
        return Err(StoreError::UnsupportedScheme(scheme.to_string()));
    };

    store.ping().await?;
    tracing::info!(backend = store.backend(), "document store connected");

    Ok(store)
}
