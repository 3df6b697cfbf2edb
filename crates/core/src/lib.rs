//! Core types and shared functionality for the static asset cache.
//!
//! This crate provides:
//! - Durable store with SQLite backend
//! - URL eligibility and classification
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, CachePolicy, CacheStats};
pub use classify::{Classification, classify};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use error::Error;
