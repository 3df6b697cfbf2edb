//! asset-cache server entry point.
//!
//! Boots the MCP server on stdio transport over a lazily opened asset store.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use assetcache_client::AssetCache;
use assetcache_core::AppConfig;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

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
    tracing::info!(
        db_path = %config.db_path.display(),
        ttl_secs = config.ttl_secs,
        max_entries = config.max_entries,
        max_total_bytes = config.max_total_bytes,
        "Starting asset-cache server on stdio transport"
    );

    let cache = AssetCache::from_config(&config)?;
    let handler = handler::AssetCacheServer::new(Arc::new(cache));
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
