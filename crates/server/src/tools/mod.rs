//! MCP tool implementations.
//!
//! This module contains all tools exposed by the asset cache server.

pub mod assets;
pub mod cache;

pub use assets::{AssetOutput, AssetParams};
