//! # HTTP Server
//!
//! Combines the health, collection and static routers behind the shared
//! middleware stack.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::config::{ConfigError, GatewayConfig};
use super::health_routes::health_routes;
use super::middleware::{log_requests, request_id};
use crate::rest_api::{collection_routes, CollectionResolver, RestState};
use crate::store::DocumentStore;

/// HTTP server for the collection gateway
pub struct HttpServer {
    config: GatewayConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over an already connected store
    pub fn new(config: GatewayConfig, store: Arc<dyn DocumentStore>) -> Self {
        let router = Self::build_router(&config, store);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &GatewayConfig, store: Arc<dyn DocumentStore>) -> Router {
        let resolver = CollectionResolver::new(
            Arc::clone(&store),
            config.collection_policy(),
            config.search_fields.clone(),
            config.store_timeout(),
        );
        let rest_state = Arc::new(RestState::new(resolver));

        Router::new()
            .merge(health_routes(store, config.store_timeout()))
            .merge(collection_routes(rest_state))
            .nest_service("/static", ServeDir::new(&config.static_dir))
            .layer(cors_layer(&config.cors_origins))
            .layer(from_fn(log_requests))
            .layer(from_fn(request_id))
            .layer(TraceLayer::new_for_http())
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn start(self) -> std::io::Result<()> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            %addr,
            static_dir = %self.config.static_dir.display(),
            restricted = !self.config.allowed_collections.is_empty(),
            "collection gateway listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("server shutdown complete");
        Ok(())
    }
}

/// Permissive CORS over exactly the routed methods
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::OPTIONS,
            Method::POST,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([
            header::ORIGIN,
            header::ACCEPT,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCESS_CONTROL_REQUEST_METHOD,
            header::ACCESS_CONTROL_REQUEST_HEADERS,
        ]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_server_with_custom_port() {
        let config = GatewayConfig {
            port: 8080,
            ..GatewayConfig::for_store("memory://")
        };
        let server = HttpServer::new(config, Arc::new(MemoryStore::new()));
        assert_eq!(server.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
    }
}
