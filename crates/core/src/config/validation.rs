//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

/// Longest accepted TTL (10 years).
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `ttl_secs`, `max_entries` or `max_total_bytes` is 0
    /// - `ttl_secs` exceeds 10 years
    /// - `max_fetch_bytes` is 0 or larger than `max_total_bytes`
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_secs == 0 {
            return Err(ConfigError::Invalid { field: "ttl_secs".into(), reason: "must be greater than 0".into() });
        }
        if self.ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::Invalid {
                field: "ttl_secs".into(),
                reason: format!("must not exceed 10 years ({MAX_TTL_SECS}s)"),
            });
        }
        if self.max_entries == 0 {
            return Err(ConfigError::Invalid { field: "max_entries".into(), reason: "must be greater than 0".into() });
        }
        if self.max_total_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_total_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.max_fetch_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_fetch_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_fetch_bytes > self.max_total_bytes {
            return Err(ConfigError::Invalid {
                field: "max_fetch_bytes".into(),
                reason: "must not exceed max_total_bytes".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.max_entries > 100_000 {
            tracing::warn!(
                max_entries = self.max_entries,
                "max_entries is very large; maintenance scans will slow down"
            );
        }

        Ok(())
    }
}
