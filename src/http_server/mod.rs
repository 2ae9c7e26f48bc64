//! # HTTP Server Module
//!
//! Axum server exposing the collection gateway.
//!
//! # Endpoints
//!
//! - `/` - Liveness text
//! - `/health` - Store health check
//! - `/collection/{name}[/{id}]` - Collection CRUD
//! - `/search/{name}?query=` - Substring search
//! - `/static/*` - Static files

pub mod config;
pub mod health_routes;
pub mod middleware;
pub mod server;

pub use config::{ConfigError, GatewayConfig};
pub use server::HttpServer;
