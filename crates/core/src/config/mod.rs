//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ASSET_CACHE_*)
//! 2. TOML config file (if ASSET_CACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;
use crate::cache::maintenance::{DEFAULT_MAX_ENTRIES, DEFAULT_MAX_TOTAL_BYTES, DEFAULT_TTL};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ASSET_CACHE_*)
/// 2. TOML config file (if ASSET_CACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via ASSET_CACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest single payload accepted from the network.
    #[serde(default = "default_max_fetch_bytes")]
    pub max_fetch_bytes: u64,

    /// Entry time-to-live in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of stored entries.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Maximum total payload bytes before size eviction kicks in.
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./asset-cache.sqlite")
}

fn default_user_agent() -> String {
    "asset-cache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_fetch_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.num_seconds() as u64
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_max_total_bytes() -> u64 {
    DEFAULT_MAX_TOTAL_BYTES
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_fetch_bytes: default_max_fetch_bytes(),
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            max_total_bytes: default_max_total_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Capacity bounds for maintenance.
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            ttl: i64::try_from(self.ttl_secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .unwrap_or(chrono::Duration::MAX),
            max_entries: self.max_entries,
            max_total_bytes: self.max_total_bytes,
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `ASSET_CACHE_`
    /// 2. TOML file from `ASSET_CACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("ASSET_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("ASSET_CACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./asset-cache.sqlite"));
        assert_eq!(config.user_agent, "asset-cache/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.ttl_secs, 604_800);
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.max_total_bytes, 500 * 1024 * 1024);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_policy_matches_defaults() {
        assert_eq!(AppConfig::default().policy(), CachePolicy::default());
    }

    #[test]
    fn test_policy_from_custom_values() {
        let config = AppConfig { ttl_secs: 60, max_entries: 3, max_total_bytes: 1024, ..Default::default() };
        let policy = config.policy();
        assert_eq!(policy.ttl, chrono::Duration::minutes(1));
        assert_eq!(policy.max_entries, 3);
        assert_eq!(policy.max_total_bytes, 1024);
    }

    #[test]
    fn test_policy_saturates_oversized_ttl() {
        let config = AppConfig { ttl_secs: u64::MAX, ..Default::default() };
        assert_eq!(config.policy().ttl, chrono::Duration::MAX);

        let config = AppConfig { ttl_secs: 10_000_000_000_000, ..Default::default() };
        assert_eq!(config.policy().ttl, chrono::Duration::seconds(10_000_000_000_000));
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("cache.toml", "max_entries = 42\nttl_secs = 3600\n")?;
            jail.set_env("ASSET_CACHE_CONFIG_FILE", "cache.toml");
            jail.set_env("ASSET_CACHE_TTL_SECS", "120");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.max_entries, 42);
            assert_eq!(config.ttl_secs, 120);
            Ok(())
        });
    }
}
