//! Cache maintenance and inspection MCP tools.
//!
//! This module provides tools for clearing and inspecting the asset store.

pub mod purge;
pub mod stats;

pub use purge::{InvalidateParams, clear_failed_impl, clear_impl, invalidate_impl, maintain_impl};
pub use stats::{list_impl, stats_impl};
