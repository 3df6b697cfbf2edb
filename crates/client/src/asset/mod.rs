//! Static resource cache.
//!
//! `AssetCache` sits between callers that need an asset and two
//! collaborators: the durable store (`CacheDb`) and a `ResourceFetcher`.
//!
//! ### Read path
//! - Ineligible URLs short-circuit to `None` with no store or network access.
//! - `try_get_cached` never touches the network. Expired and malformed
//!   entries are deleted on sight. Recorded failures are skipped but kept.
//! - `get_or_fetch` falls back to a retrieval on any miss, including a
//!   recorded failure, persists the outcome and runs capacity maintenance
//!   after a success.
//!
//! ### Failure policy
//! No operation returns an error. Store failures are logged and the cache
//! behaves as if empty; retrieval failures are recorded and reported as
//! `None`.
//!
//! ### Concurrency
//! Concurrent `get_or_fetch` calls for the same URL are not coalesced:
//! each may retrieve and write, and the last write wins.

mod reference;

pub use reference::CachedAsset;

use std::path::PathBuf;
use std::sync::Arc;

use assetcache_core::cache::{CacheEntry, CachePolicy, CacheStats, EntryMeta, MaintenanceReport};
use assetcache_core::{AppConfig, CacheDb, Classification, Clock, Error, SystemClock, classify};
use bytes::Bytes;
use tokio::sync::OnceCell;

use crate::fetch::{FetchConfig, FetchError, HttpFetcher, ResourceFetcher};

/// Where the durable store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    InMemory,
}

impl StoreLocation {
    async fn open(&self) -> Result<CacheDb, Error> {
        match self {
            StoreLocation::File(path) => CacheDb::open(path).await,
            StoreLocation::InMemory => CacheDb::open_in_memory().await,
        }
    }
}

/// Persistent cache for static resources.
pub struct AssetCache<F = HttpFetcher> {
    /// `None` when the caller supplied an opened store.
    location: Option<StoreLocation>,
    store: OnceCell<CacheDb>,
    fetcher: F,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
}

impl AssetCache<HttpFetcher> {
    /// Build a cache over an HTTP fetcher from application config.
    ///
    /// The store is opened lazily on first use.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(FetchConfig::from(config))?;
        Ok(Self::new(StoreLocation::File(config.db_path.clone()), config.policy(), fetcher))
    }
}

impl<F: ResourceFetcher> AssetCache<F> {
    pub fn new(location: StoreLocation, policy: CachePolicy, fetcher: F) -> Self {
        Self { location: Some(location), store: OnceCell::new(), fetcher, policy, clock: Arc::new(SystemClock) }
    }

    /// Build a cache over an already opened store.
    pub fn with_store(db: CacheDb, policy: CachePolicy, fetcher: F) -> Self {
        Self {
            location: None,
            store: OnceCell::from(db),
            fetcher,
            policy,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Where the store is opened from, if this cache opens it itself.
    pub fn location(&self) -> Option<&StoreLocation> {
        self.location.as_ref()
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Open the store on first use; a failed open is retried on the next call.
    async fn store(&self) -> Option<&CacheDb> {
        let opened = self
            .store
            .get_or_try_init(|| async {
                match &self.location {
                    Some(location) => location.open().await,
                    None => Err(Error::InvalidInput("no store location to open".into())),
                }
            })
            .await;
        match opened {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!(location = ?self.location, "asset store unavailable: {}", e);
                None
            }
        }
    }

    /// Look up a URL without touching the network.
    pub async fn try_get_cached(&self, url: &str) -> Option<CachedAsset> {
        classify(url)?;
        let db = self.store().await?;

        let entry = match db.get_entry(url).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e @ Error::CorruptEntry { .. }) => {
                tracing::warn!("dropping unreadable cache entry: {}", e);
                self.delete_quietly(db, url).await;
                return None;
            }
            Err(e) => {
                tracing::warn!("cache lookup failed for {}: {}", url, e);
                return None;
            }
        };

        if entry.is_expired(self.clock.now(), self.policy.ttl) {
            tracing::debug!("cache entry expired for {}", url);
            self.delete_quietly(db, url).await;
            return None;
        }

        if entry.is_failure() {
            tracing::debug!("recorded failure for {}, not a hit", url);
            return None;
        }

        if entry.payload.is_empty() {
            tracing::warn!("successful entry for {} has no payload, dropping", url);
            self.delete_quietly(db, url).await;
            return None;
        }

        tracing::debug!("cache hit for {}", url);
        Some(CachedAsset::new(entry.url, entry.classification, Bytes::from(entry.payload)))
    }

    /// Look up a URL, retrieving and storing it on a miss.
    pub async fn get_or_fetch(&self, url: &str) -> Option<CachedAsset> {
        let classification = classify(url)?;

        if let Some(hit) = self.try_get_cached(url).await {
            return Some(hit);
        }

        match self.fetcher.fetch(url).await {
            Ok(bytes) => {
                let now = self.clock.now();
                let entry = CacheEntry::success(url, classification, bytes.to_vec(), now);
                self.populate(&entry).await;
                Some(CachedAsset::new(url, classification, bytes))
            }
            Err(e) => {
                tracing::warn!("fetch failed for {}: {}", url, e);
                self.record_failure(url, classification).await;
                None
            }
        }
    }

    /// Remove the entry for one URL.
    pub async fn invalidate(&self, url: &str) {
        if let Some(db) = self.store().await {
            self.delete_quietly(db, url).await;
        }
    }

    /// Remove every entry.
    pub async fn clear_all(&self) {
        let Some(db) = self.store().await else { return };
        match db.delete_all().await {
            Ok(n) => tracing::debug!("cleared {} cache entries", n),
            Err(e) => tracing::warn!("failed to clear cache: {}", e),
        }
    }

    /// Remove recorded failures only.
    pub async fn clear_failed_entries(&self) {
        let Some(db) = self.store().await else { return };
        match db.delete_failed().await {
            Ok(n) => tracing::debug!("cleared {} failed cache entries", n),
            Err(e) => tracing::warn!("failed to clear failed entries: {}", e),
        }
    }

    /// Store statistics; all zero when the store is unavailable.
    pub async fn stats(&self) -> CacheStats {
        let Some(db) = self.store().await else { return CacheStats::default() };
        db.stats().await.unwrap_or_else(|e| {
            tracing::warn!("failed to read cache stats: {}", e);
            CacheStats::default()
        })
    }

    /// Metadata for every stored entry, oldest first.
    pub async fn entries(&self) -> Vec<EntryMeta> {
        let Some(db) = self.store().await else { return Vec::new() };
        db.list_entries().await.unwrap_or_else(|e| {
            tracing::warn!("failed to list cache entries: {}", e);
            Vec::new()
        })
    }

    /// Run capacity maintenance now.
    pub async fn run_maintenance(&self) -> MaintenanceReport {
        let Some(db) = self.store().await else { return MaintenanceReport::default() };
        db.enforce_policy(&self.policy, self.clock.now())
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("cache maintenance failed: {}", e);
                MaintenanceReport::default()
            })
    }

    async fn populate(&self, entry: &CacheEntry) {
        let Some(db) = self.store().await else { return };
        if let Err(e) = db.put_entry(entry).await {
            tracing::warn!("failed to cache {}: {}", entry.url, e);
        }
        if let Err(e) = db.enforce_policy(&self.policy, entry.created_at).await {
            tracing::warn!("cache maintenance failed: {}", e);
        }
    }

    async fn record_failure(&self, url: &str, classification: Classification) {
        let Some(db) = self.store().await else { return };
        let entry = CacheEntry::failure(url, classification, self.clock.now());
        if let Err(e) = db.put_entry(&entry).await {
            tracing::warn!("failed to record fetch failure for {}: {}", url, e);
        }
    }

    async fn delete_quietly(&self, db: &CacheDb, url: &str) {
        if let Err(e) = db.delete_entry(url).await {
            tracing::warn!("failed to delete cache entry {}: {}", url, e);
        }
    }
}
