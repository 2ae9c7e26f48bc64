//! collection-gateway - HTTP CRUD and search over named document collections
//!
//! Requests name a collection in the path; the gateway validates the name,
//! binds it to the configured document store and performs one store call.

pub mod http_server;
pub mod observability;
pub mod rest_api;
pub mod store;
