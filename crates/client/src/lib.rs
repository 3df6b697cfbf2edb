//! Client code for the static asset cache.
//!
//! This crate provides the network retrieval seam and the `AssetCache`
//! that serves resources from the durable store, falling back to the
//! network on a miss.

pub mod asset;
pub mod fetch;

pub use asset::{AssetCache, CachedAsset, StoreLocation};
pub use fetch::{FetchConfig, FetchError, HttpFetcher, ResourceFetcher};
