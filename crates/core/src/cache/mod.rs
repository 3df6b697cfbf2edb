//! SQLite-backed durable store for static resources.
//!
//! This module provides a persistent key-value store keyed by resource URL,
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - One entry per URL with UPSERT replacement
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Capacity maintenance (age sweep, count cap, size cap)
//! - Aggregate statistics

pub mod connection;
pub mod entries;
pub mod maintenance;
pub mod migrations;
pub mod stats;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CacheEntry, EntryMeta};
pub use maintenance::{CachePolicy, MaintenanceReport};
pub use stats::{CacheStats, ClassificationCounts};
