//! asset_get and asset_lookup tool implementations.
//!
//! Both resolve a resource URL through the cache. `asset_get` may hit the
//! network on a miss; `asset_lookup` never does.

use assetcache_client::{AssetCache, CachedAsset, ResourceFetcher};
use assetcache_core::{Classification, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for asset_get and asset_lookup.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetParams {
    /// The resource URL.
    pub url: String,

    /// Include the payload as a base64 `data:` URL.
    #[serde(default)]
    pub include_data: bool,
}

/// Output from asset_get and asset_lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AssetOutput {
    /// The URL requested.
    pub url: String,
    /// Whether a payload is available. False for ineligible URLs, misses
    /// and failed retrievals.
    pub found: bool,
    pub classification: Option<Classification>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub data_url: Option<String>,
}

impl AssetOutput {
    fn new(url: &str, asset: Option<CachedAsset>, include_data: bool) -> Self {
        match asset {
            Some(asset) => Self {
                url: url.to_string(),
                found: true,
                classification: Some(asset.classification()),
                mime_type: Some(asset.mime_type().to_string()),
                size_bytes: Some(asset.size_bytes()),
                data_url: include_data.then(|| asset.to_data_url()),
            },
            None => Self { url: url.to_string(), ..Default::default() },
        }
    }
}

fn validate(params: &AssetParams) -> Result<(), Error> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }
    Ok(())
}

fn to_result(output: &AssetOutput) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the asset_get tool.
pub async fn get_impl<F: ResourceFetcher>(
    cache: &AssetCache<F>, params: AssetParams,
) -> Result<CallToolResult, McpError> {
    validate(&params)?;
    let asset = cache.get_or_fetch(&params.url).await;
    to_result(&AssetOutput::new(&params.url, asset, params.include_data))
}

/// Implementation of the asset_lookup tool.
pub async fn lookup_impl<F: ResourceFetcher>(
    cache: &AssetCache<F>, params: AssetParams,
) -> Result<CallToolResult, McpError> {
    validate(&params)?;
    let asset = cache.try_get_cached(&params.url).await;
    to_result(&AssetOutput::new(&params.url, asset, params.include_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{StaticFetcher, output_of, test_cache};

    #[tokio::test]
    async fn test_get_then_lookup() {
        let cache = test_cache(StaticFetcher::new(&[("https://x.io/a.png", "PNG")])).await;

        let params = AssetParams { url: "https://x.io/a.png".into(), include_data: true };
        let output: AssetOutput = output_of(get_impl(&cache, params.clone()).await.unwrap());
        assert!(output.found);
        assert_eq!(output.classification, Some(Classification::RasterImage));
        assert_eq!(output.size_bytes, Some(3));
        assert_eq!(output.data_url.as_deref(), Some("data:image/png;base64,UE5H"));

        let output: AssetOutput = output_of(lookup_impl(&cache, params).await.unwrap());
        assert!(output.found);
    }

    #[tokio::test]
    async fn test_lookup_miss_is_not_an_error() {
        let cache = test_cache(StaticFetcher::new(&[])).await;
        let params = AssetParams { url: "https://x.io/a.png".into(), include_data: false };

        let output: AssetOutput = output_of(lookup_impl(&cache, params).await.unwrap());
        assert!(!output.found);
        assert!(output.classification.is_none());
    }

    #[tokio::test]
    async fn test_data_omitted_by_default() {
        let cache = test_cache(StaticFetcher::new(&[("https://x.io/a.svg", "<svg/>")])).await;
        let params: AssetParams = serde_json::from_str(r#"{"url":"https://x.io/a.svg"}"#).unwrap();

        let output: AssetOutput = output_of(get_impl(&cache, params).await.unwrap());
        assert!(output.found);
        assert!(output.data_url.is_none());
        assert_eq!(output.mime_type.as_deref(), Some("image/svg+xml"));
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let cache = test_cache(StaticFetcher::new(&[])).await;
        let params = AssetParams { url: "  ".into(), include_data: false };
        assert!(get_impl(&cache, params).await.is_err());
    }
}
