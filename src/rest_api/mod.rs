//! # REST API Module
//!
//! HTTP endpoints for CRUD and search over named collections. Each request
//! resolves its collection through a [`CollectionResolver`] and performs
//! exactly one document store call.

pub mod errors;
pub mod handler;
pub mod policy;
pub mod response;
pub mod server;

pub use errors::{RestError, RestResult};
pub use handler::{CollectionHandle, CollectionResolver};
pub use policy::CollectionPolicy;
pub use response::MessageResponse;
pub use server::{collection_routes, RestState};
