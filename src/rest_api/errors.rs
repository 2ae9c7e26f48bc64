//! # REST API Errors
//!
//! Error types for the REST API module.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// REST API errors
#[derive(Debug, Clone, Error)]
pub enum RestError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Identifier is not a valid object id
    #[error("Invalid document id: {0}")]
    InvalidId(String),

    /// Collection name violates the naming convention
    #[error("Invalid collection name: {0}")]
    InvalidCollectionName(String),

    /// Collection is outside the configured allow-list
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Invalid request body
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Path parameters could not be extracted
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Query string could not be deserialized
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Store did not answer within the configured bound
    #[error("Document store timed out after {0}ms")]
    StoreTimeout(u64),

    /// Store operation failed
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            RestError::InvalidId(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidCollectionName(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            RestError::Store(StoreError::InvalidId(_)) => StatusCode::BAD_REQUEST,
            RestError::Store(StoreError::InvalidDocument(_)) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            RestError::CollectionNotFound(_) => StatusCode::NOT_FOUND,

            // 504 Gateway Timeout
            RestError::StoreTimeout(_) => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            RestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            RestError::InvalidId(_) | RestError::Store(StoreError::InvalidId(_)) => "invalid_id",
            RestError::InvalidCollectionName(_) => "invalid_collection_name",
            RestError::CollectionNotFound(_) => "collection_not_found",
            RestError::InvalidBody(_) | RestError::Store(StoreError::InvalidDocument(_)) => {
                "invalid_body"
            }
            RestError::InvalidPath(_) => "invalid_path",
            RestError::InvalidQuery(_) => "invalid_query",
            RestError::StoreTimeout(_) => "store_timeout",
            RestError::Store(_) => "store",
        }
    }

    /// Message exposed to clients. Server faults stay opaque.
    fn public_message(&self) -> String {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            "document store error".to_string()
        } else {
            self.to_string()
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
}

impl From<&RestError> for ErrorResponse {
    fn from(err: &RestError) -> Self {
        Self {
            error: err.public_message(),
            code: err.status_code().as_u16(),
            kind: err.kind(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "request rejected");
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
