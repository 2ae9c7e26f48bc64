//! # Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Could not reach or authenticate against the store
    #[error("Store connection failed: {0}")]
    Connection(String),

    /// Connection string scheme has no backend
    #[error("Unsupported store scheme: {0}")]
    UnsupportedScheme(String),

    /// Database name is required by the backend but was not configured
    #[error("Database name is required for this store")]
    MissingDatabase,

    /// Identifier is not a valid object id
    #[error("Invalid document id: {0}")]
    InvalidId(String),

    /// Document cannot be represented in the store
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Operation failed inside the store
    #[error("Store operation failed: {0}")]
    Backend(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::InvalidDocument(err.to_string())
    }
}
