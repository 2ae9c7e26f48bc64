//! Collection gateway entry point
//!
//! Loads configuration, connects to the document store (failing fast when it
//! is unreachable) and serves HTTP until shutdown.

use anyhow::Context;

use collection_gateway::http_server::{GatewayConfig, HttpServer};
use collection_gateway::observability::{init_logging, LogFormat};
use collection_gateway::store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::load()?;
    init_logging(&config.log_level, LogFormat::from_json_flag(config.log_json));

    let store = store::connect(config.connection_string()?, config.database.as_deref())
        .await
        .context("document store unavailable")?;

    HttpServer::new(config, store).start().await?;

    Ok(())
}
