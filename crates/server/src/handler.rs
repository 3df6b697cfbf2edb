//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use assetcache_client::AssetCache;

use crate::tools::{
    AssetParams, assets,
    cache::{self, InvalidateParams},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for the asset cache.
#[derive(Clone)]
pub struct AssetCacheServer {
    cache: Arc<AssetCache>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl AssetCacheServer {
    /// Create a new server handler.
    pub fn new(cache: Arc<AssetCache>) -> Self {
        Self { cache, tool_router: Self::tool_router() }
    }

    #[tool(description = "Resolve a static asset URL, fetching and caching it on a miss. \
        Images, SVG, fonts, stylesheets, scripts and documents are cacheable; video and GIF are not.")]
    async fn asset_get(&self, params: Parameters<AssetParams>) -> Result<CallToolResult, McpError> {
        assets::get_impl(self.cache.as_ref(), params.0).await
    }

    #[tool(description = "Look up a static asset in the cache without any network access.")]
    async fn asset_lookup(&self, params: Parameters<AssetParams>) -> Result<CallToolResult, McpError> {
        assets::lookup_impl(self.cache.as_ref(), params.0).await
    }

    #[tool(description = "Remove the cached entry for one URL.")]
    async fn asset_invalidate(&self, params: Parameters<InvalidateParams>) -> Result<CallToolResult, McpError> {
        cache::invalidate_impl(self.cache.as_ref(), params.0).await
    }

    #[tool(description = "Remove every cached entry.")]
    async fn asset_clear(&self) -> Result<CallToolResult, McpError> {
        cache::clear_impl(self.cache.as_ref()).await
    }

    #[tool(description = "Remove recorded fetch failures, keeping successful entries.")]
    async fn asset_clear_failed(&self) -> Result<CallToolResult, McpError> {
        cache::clear_failed_impl(self.cache.as_ref()).await
    }

    #[tool(description = "Report entry count, total size, per-type counts and success/failure counts.")]
    async fn asset_stats(&self) -> Result<CallToolResult, McpError> {
        cache::stats_impl(self.cache.as_ref()).await
    }

    #[tool(description = "Run capacity maintenance now: drop expired entries, then enforce the entry \
        and size caps. Reports how many entries each step removed.")]
    async fn asset_maintain(&self) -> Result<CallToolResult, McpError> {
        cache::maintain_impl(self.cache.as_ref()).await
    }

    #[tool(description = "List cached entries (metadata only), oldest first.")]
    async fn asset_list(&self) -> Result<CallToolResult, McpError> {
        cache::list_impl(self.cache.as_ref()).await
    }
}

impl ServerHandler for AssetCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "asset-cache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
