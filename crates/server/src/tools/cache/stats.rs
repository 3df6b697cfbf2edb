//! asset_stats and asset_list tool implementations.

use assetcache_client::{AssetCache, ResourceFetcher};
use assetcache_core::Error;
use assetcache_core::cache::EntryMeta;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output from the asset_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListOutput {
    /// Stored entries, oldest first, without payloads.
    pub entries: Vec<EntryMeta>,
}

/// Implementation of the asset_stats tool.
pub async fn stats_impl<F: ResourceFetcher>(cache: &AssetCache<F>) -> Result<CallToolResult, McpError> {
    let stats = cache.stats().await;
    let json = serde_json::to_string_pretty(&stats)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize stats: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the asset_list tool.
pub async fn list_impl<F: ResourceFetcher>(cache: &AssetCache<F>) -> Result<CallToolResult, McpError> {
    let output = ListOutput { entries: cache.entries().await };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entries: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
