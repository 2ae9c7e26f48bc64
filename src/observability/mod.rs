//! Observability for the gateway.
//!
//! Structured logging through `tracing`; see [`logger::init_logging`].

pub mod logger;

pub use logger::{init_logging, LogFormat};
