//! HTTP Server Configuration
//!
//! Gateway settings read from the process environment (and a `.env` file
//! when present). Variable names are the upper-case field names, e.g.
//! `CONNECTION_STRING`, `DATABASE`, `PORT`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rest_api::CollectionPolicy;
use crate::store::search::DEFAULT_SEARCH_FIELDS;

/// Keys parsed as comma-separated lists
const LIST_KEYS: [&str; 3] = ["cors_origins", "allowed_collections", "search_fields"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("Failed to read .env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// A missing `.env` file is normal outside development; a malformed one is not
fn env_file_loaded<T>(result: Result<T, dotenvy::Error>) -> Result<bool, ConfigError> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(ConfigError::EnvFile(e)),
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Store connection string (`mongodb://...` or `memory://`)
    #[serde(default)]
    pub connection_string: Option<String>,

    /// Database name inside the store
    #[serde(default)]
    pub database: Option<String>,

    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory mounted under `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// CORS allowed origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Collections clients may address; empty means any valid name
    #[serde(default)]
    pub allowed_collections: Vec<String>,

    /// Fields matched by `/search`
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,

    /// Upper bound for a single store call, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Default log filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_search_fields() -> Vec<String> {
    DEFAULT_SEARCH_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn default_store_timeout_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            database: None,
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            cors_origins: Vec::new(),
            allowed_collections: Vec::new(),
            search_fields: default_search_fields(),
            store_timeout_ms: default_store_timeout_ms(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl GatewayConfig {
    /// Load from `.env` and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        env_file_loaded(dotenvy::dotenv())?;
        Self::from_env(None)
    }

    /// Load from an explicit variable map instead of the process environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_env(Some(vars))
    }

    fn from_env(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let mut environment = config::Environment::default()
            .try_parsing(true)
            .list_separator(",")
            .source(vars);
        for key in LIST_KEYS {
            environment = environment.with_list_parse_key(key);
        }

        let config: GatewayConfig = config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Create a config for a store with defaults everywhere else
    pub fn for_store(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: Some(connection_string.into()),
            ..Default::default()
        }
    }

    /// The store connection string, which must be configured
    pub fn connection_string(&self) -> Result<&str, ConfigError> {
        self.connection_string
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("CONNECTION_STRING"))
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidAddress(addr))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn collection_policy(&self) -> CollectionPolicy {
        CollectionPolicy::allow_list(
            self.allowed_collections
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty()),
        )
    }
}
