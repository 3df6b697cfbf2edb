//! Network retrieval of static resources.
//!
//! ### Contract
//! - A retrieval either yields the full, non-empty body of a 2xx response
//!   or a `FetchError`.
//! - Transport failures (DNS, TLS, refused or reset connections, blocked
//!   cross-origin requests) surface as `FetchError::Network`.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: 50MB (configurable)
//! - Request timeout: 20s (configurable)

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};
use std::sync::Arc;
use std::time::{Duration, Instant};

use assetcache_core::AppConfig;
pub use url::{UrlError, canonicalize};

/// Errors from a resource retrieval.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("response too large: {len} bytes exceeds {max}")]
    TooLarge { len: u64, max: u64 },

    #[error("empty response body")]
    EmptyBody,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Network(err.to_string()) }
    }
}

/// Issues a GET for a resource URL and returns its bytes.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

#[async_trait]
impl<T: ResourceFetcher + ?Sized> ResourceFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        (**self).fetch(url).await
    }
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "asset-cache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 50MB)
    pub max_bytes: u64,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "asset-cache/0.1".to_string(),
            max_bytes: 50 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_fetch_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn check_len(&self, len: u64) -> Result<(), FetchError> {
        if len > self.config.max_bytes {
            return Err(FetchError::TooLarge { len, max: self.config.max_bytes });
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url_str: &str) -> Result<Bytes, FetchError> {
        let start = Instant::now();
        let url = canonicalize(url_str)?;

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "image/avif,image/webp,image/*,*/*;q=0.8")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            self.check_len(len)?;
        }

        let bytes = response.bytes().await?;
        self.check_len(bytes.len() as u64)?;

        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        tracing::debug!(
            "fetched {} in {}ms ({} bytes)",
            url,
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(bytes)
    }
}
