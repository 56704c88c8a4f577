//! shellcache server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{CacheManager, FetchClient, FetchConfig, RecordedHost};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, version = %config.version, "Starting shellcache server on stdio transport");

    let storage = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let host = Arc::new(RecordedHost::new());
    let manager = CacheManager::new(&config, storage, network, host.clone())?;

    match manager.resume().await {
        Ok(true) => tracing::info!(generation = %manager.static_cache_name(), "resumed active version"),
        Ok(false) => tracing::info!(state = ?manager.state().await, "waiting for install"),
        Err(e) => tracing::warn!("could not inspect stored caches: {}", e),
    }

    let handler = handler::ShellCacheServer::new(Arc::new(manager), host);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
