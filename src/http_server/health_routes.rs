//! Liveness and health routes.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::store::DocumentStore;

/// Text served at `/`
pub const ROOT_MESSAGE: &str = "Select a collection, e.g., /collection/messages";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub version: &'static str,
}

struct HealthState {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

/// Create `/` and `/health`
pub fn health_routes(store: Arc<dyn DocumentStore>, timeout: Duration) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(Arc::new(HealthState { store, timeout }))
}

async fn root_handler() -> &'static str {
    ROOT_MESSAGE
}

/// Reports `ok` only when the store answers a ping in time
async fn health_handler(
    State(state): State<Arc<HealthState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let reachable = matches!(
        tokio::time::timeout(state.timeout, state.store.ping()).await,
        Ok(Ok(()))
    );

    let (status, label) = if reachable {
        (StatusCode::OK, "ok")
    } else {
        tracing::warn!(store = state.store.backend(), "health check: store unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            store: state.store.backend(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
