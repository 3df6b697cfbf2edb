//! asset_invalidate, asset_clear, asset_clear_failed and asset_maintain tool
//! implementations.
//!
//! Removes entries from the store. The clearing tools report the entry count
//! before and after; asset_maintain reports what each maintenance step removed.

use assetcache_client::{AssetCache, ResourceFetcher};
use assetcache_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the asset_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InvalidateParams {
    /// The resource URL whose entry should be removed.
    pub url: String,
}

/// Output from the purge tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
    /// Entries left in the store.
    pub remaining: u64,
}

async fn purge_with<F, Fut>(cache: &AssetCache<F>, purge: impl FnOnce() -> Fut) -> Result<CallToolResult, McpError>
where
    F: ResourceFetcher,
    Fut: Future<Output = ()>,
{
    let before = cache.stats().await.count;
    purge().await;
    let remaining = cache.stats().await.count;

    let output = PurgeOutput { deleted: before.saturating_sub(remaining), remaining };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the asset_invalidate tool.
pub async fn invalidate_impl<F: ResourceFetcher>(
    cache: &AssetCache<F>, params: InvalidateParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    purge_with(cache, || cache.invalidate(&params.url)).await
}

/// Implementation of the asset_clear tool.
pub async fn clear_impl<F: ResourceFetcher>(cache: &AssetCache<F>) -> Result<CallToolResult, McpError> {
    purge_with(cache, || cache.clear_all()).await
}

/// Implementation of the asset_clear_failed tool.
pub async fn clear_failed_impl<F: ResourceFetcher>(cache: &AssetCache<F>) -> Result<CallToolResult, McpError> {
    purge_with(cache, || cache.clear_failed_entries()).await
}

/// Implementation of the asset_maintain tool.
pub async fn maintain_impl<F: ResourceFetcher>(cache: &AssetCache<F>) -> Result<CallToolResult, McpError> {
    let report = cache.run_maintenance().await;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize report: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
