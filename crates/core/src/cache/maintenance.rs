//! Capacity maintenance.
//!
//! Runs after every successful population, in a fixed order:
//!
//! 1. Age sweep: drop entries older than the TTL.
//! 2. Count cap: drop the oldest entries until at most `max_entries` remain.
//! 3. Size cap: if total bytes exceed `max_total_bytes`, drop the largest
//!    fifth of the remaining entries by count. This is a heuristic and does
//!    not guarantee the total ends up under the cap.

use super::connection::CacheDb;
use crate::Error;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Default time-to-live (7 days).
pub const DEFAULT_TTL: Duration = Duration::days(7);

/// Default maximum number of entries.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Default maximum total payload size (500 MB).
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 500 * 1024 * 1024;

/// Share of entries, by count, removed when the size cap is exceeded.
pub const SIZE_EVICTION_FRACTION: f64 = 0.2;

/// Bounds enforced by maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub max_entries: usize,
    pub max_total_bytes: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL, max_entries: DEFAULT_MAX_ENTRIES, max_total_bytes: DEFAULT_MAX_TOTAL_BYTES }
    }
}

/// What a maintenance pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub expired: u64,
    pub over_count: u64,
    pub over_size: u64,
}

impl MaintenanceReport {
    pub fn total(&self) -> u64 {
        self.expired + self.over_count + self.over_size
    }
}

/// Number of entries the size cap removes from `count` entries.
///
/// Rounds up and never returns zero for a non-empty store, so a single
/// oversized entry can still be evicted.
pub fn size_eviction_count(count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    ((count as f64 * SIZE_EVICTION_FRACTION).ceil() as u64).max(1)
}

impl CacheDb {
    /// Delete entries created before `cutoff`.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let cutoff_ms = cutoff.timestamp_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM resources WHERE created_at < ?1", params![cutoff_ms])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries whose age at `now` exceeds `ttl`.
    ///
    /// A TTL reaching past the earliest representable time sweeps nothing.
    pub async fn purge_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<u64, Error> {
        match now.checked_sub_signed(ttl) {
            Some(cutoff) => self.purge_created_before(cutoff).await,
            None => Ok(0),
        }
    }

    /// Purge oldest entries until count <= max_entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_oldest(&self, max_entries: usize) -> Result<u64, Error> {
        let max = i64::try_from(max_entries).unwrap_or(i64::MAX);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?;
                if count <= max {
                    return Ok(0);
                }

                let to_delete = count - max;
                let deleted = conn.execute(
                    "DELETE FROM resources WHERE url IN (
                    SELECT url FROM resources ORDER BY created_at ASC, url ASC LIMIT ?1
                )",
                    params![to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// If total size exceeds `max_total_bytes`, delete the largest fifth of entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_largest(&self, max_total_bytes: u64) -> Result<u64, Error> {
        let max = i64::try_from(max_total_bytes).unwrap_or(i64::MAX);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let (count, total): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM resources",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                if total <= max {
                    return Ok(0);
                }

                let to_delete = size_eviction_count(count as u64) as i64;
                let deleted = conn.execute(
                    "DELETE FROM resources WHERE url IN (
                    SELECT url FROM resources ORDER BY size_bytes DESC, created_at ASC LIMIT ?1
                )",
                    params![to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Run the three maintenance steps in order.
    pub async fn enforce_policy(&self, policy: &CachePolicy, now: DateTime<Utc>) -> Result<MaintenanceReport, Error> {
        let expired = self.purge_expired(now, policy.ttl).await?;
        let over_count = self.purge_oldest(policy.max_entries).await?;
        let over_size = self.purge_largest(policy.max_total_bytes).await?;

        let report = MaintenanceReport { expired, over_count, over_size };
        if report.total() > 0 {
            tracing::debug!(expired, over_count, over_size, "cache maintenance evicted entries");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;
    use crate::classify::Classification;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn entry(name: &str, size: usize, ms: i64) -> CacheEntry {
        CacheEntry::success(format!("https://x.io/{name}.png"), Classification::RasterImage, vec![7u8; size], at(ms))
    }

    async fn urls(db: &CacheDb) -> Vec<String> {
        db.list_entries().await.unwrap().into_iter().map(|m| m.url).collect()
    }

    #[test]
    fn test_default_policy() {
        let policy = CachePolicy::default();
        assert_eq!(policy.ttl, Duration::days(7));
        assert_eq!(policy.max_entries, 1000);
        assert_eq!(policy.max_total_bytes, 524_288_000);
    }

    #[test]
    fn test_size_eviction_count() {
        assert_eq!(size_eviction_count(0), 0);
        assert_eq!(size_eviction_count(1), 1);
        assert_eq!(size_eviction_count(5), 1);
        assert_eq!(size_eviction_count(6), 2);
        assert_eq!(size_eviction_count(10), 2);
        assert_eq!(size_eviction_count(1000), 200);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let ttl = Duration::milliseconds(100);
        db.put_entry(&entry("old", 1, 0)).await.unwrap();
        db.put_entry(&entry("edge", 1, 100)).await.unwrap();
        db.put_entry(&entry("new", 1, 150)).await.unwrap();

        let deleted = db.purge_expired(at(200), ttl).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(urls(&db).await, vec!["https://x.io/edge.png", "https://x.io/new.png"]);
    }

    #[tokio::test]
    async fn test_purge_expired_with_unbounded_ttl() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry(&entry("old", 1, 0)).await.unwrap();

        assert_eq!(db.purge_expired(at(1000), Duration::MAX).await.unwrap(), 0);
        assert_eq!(urls(&db).await.len(), 1);
    }

    #[tokio::test]
    async fn test_purge_oldest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for i in 0..5 {
            db.put_entry(&entry(&format!("e{i}"), 1, i)).await.unwrap();
        }

        assert_eq!(db.purge_oldest(3).await.unwrap(), 2);
        assert_eq!(urls(&db).await, vec!["https://x.io/e2.png", "https://x.io/e3.png", "https://x.io/e4.png"]);
        assert_eq!(db.purge_oldest(3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_largest_under_cap_is_noop() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry(&entry("a", 10, 0)).await.unwrap();
        db.put_entry(&entry("b", 10, 1)).await.unwrap();

        assert_eq!(db.purge_largest(20).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_caps_above_i64_range_are_noops() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for i in 0..5 {
            db.put_entry(&entry(&format!("e{i}"), 4, i)).await.unwrap();
        }

        let policy = CachePolicy { ttl: Duration::days(1), max_entries: usize::MAX, max_total_bytes: u64::MAX };
        let report = db.enforce_policy(&policy, at(10)).await.unwrap();

        assert_eq!(report, MaintenanceReport::default());
        assert_eq!(urls(&db).await.len(), 5);
    }

    #[tokio::test]
    async fn test_purge_largest_removes_fifth_by_count() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let sizes = [5usize, 50, 10, 40, 1, 2, 3, 4, 6, 7];
        for (i, size) in sizes.iter().enumerate() {
            db.put_entry(&entry(&format!("s{size}"), *size, i as i64)).await.unwrap();
        }

        assert_eq!(db.purge_largest(100).await.unwrap(), 2);
        let remaining = urls(&db).await;
        assert!(!remaining.contains(&"https://x.io/s50.png".to_string()));
        assert!(!remaining.contains(&"https://x.io/s40.png".to_string()));
        assert_eq!(remaining.len(), 8);
    }

    #[tokio::test]
    async fn test_purge_largest_is_approximate() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for i in 0..5 {
            db.put_entry(&entry(&format!("e{i}"), 100, i)).await.unwrap();
        }

        // One pass removes a single entry even though 400 bytes remain over a 50-byte cap.
        assert_eq!(db.purge_largest(50).await.unwrap(), 1);
        assert_eq!(db.list_entries().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_enforce_policy_ages_out_before_size_eviction() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry(&entry("stale", 30, 0)).await.unwrap();
        db.put_entry(&entry("fresh-big", 25, 900)).await.unwrap();
        db.put_entry(&entry("fresh-small", 10, 950)).await.unwrap();

        let policy = CachePolicy { ttl: Duration::milliseconds(500), max_entries: 10, max_total_bytes: 40 };
        let report = db.enforce_policy(&policy, at(1000)).await.unwrap();

        assert_eq!(report, MaintenanceReport { expired: 1, over_count: 0, over_size: 0 });
        assert_eq!(urls(&db).await.len(), 2);
    }

    #[tokio::test]
    async fn test_enforce_policy_count_then_size() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for i in 0..6 {
            db.put_entry(&entry(&format!("e{i}"), 10 + i as usize, i)).await.unwrap();
        }

        let policy = CachePolicy { ttl: Duration::days(1), max_entries: 5, max_total_bytes: 50 };
        let report = db.enforce_policy(&policy, at(10)).await.unwrap();

        assert_eq!(report.expired, 0);
        assert_eq!(report.over_count, 1);
        assert_eq!(report.over_size, 1);
        let remaining = urls(&db).await;
        assert!(!remaining.contains(&"https://x.io/e0.png".to_string()));
        assert!(!remaining.contains(&"https://x.io/e5.png".to_string()));
        assert_eq!(remaining.len(), 4);
    }
}
