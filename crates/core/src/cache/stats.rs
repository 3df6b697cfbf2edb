//! Cache statistics.

use super::connection::CacheDb;
use crate::Error;
use crate::classify::Classification;
use serde::{Deserialize, Serialize};

/// Entry counts per classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ClassificationCounts {
    pub raster_image: u64,
    pub vector_image: u64,
    pub other: u64,
}

impl ClassificationCounts {
    pub fn get(&self, classification: Classification) -> u64 {
        match classification {
            Classification::RasterImage => self.raster_image,
            Classification::VectorImage => self.vector_image,
            Classification::Other => self.other,
        }
    }

    fn add(&mut self, classification: Classification, n: u64) {
        match classification {
            Classification::RasterImage => self.raster_image += n,
            Classification::VectorImage => self.vector_image += n,
            Classification::Other => self.other += n,
        }
    }
}

/// Snapshot of store contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheStats {
    pub count: u64,
    pub total_bytes: u64,
    /// `total_bytes` in MiB, rounded to two decimals.
    pub total_megabytes: f64,
    pub count_by_classification: ClassificationCounts,
    pub success_count: u64,
    pub failure_count: u64,
}

/// Convert bytes to megabytes rounded to two decimals.
pub fn to_megabytes(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

impl CacheDb {
    /// Aggregate statistics over every entry.
    ///
    /// Rows with an unknown classification count toward the totals but not
    /// the per-classification breakdown.
    pub async fn stats(&self) -> Result<CacheStats, Error> {
        self.conn
            .call(|conn| -> Result<CacheStats, Error> {
                let mut stmt = conn.prepare(
                    "SELECT classification,
                        COUNT(*),
                        COALESCE(SUM(size_bytes), 0),
                        COALESCE(SUM(fetch_succeeded), 0),
                        COALESCE(SUM(cors_failed), 0)
                    FROM resources GROUP BY classification",
                )?;

                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })?;

                let mut stats = CacheStats::default();
                for row in rows {
                    let (classification, count, bytes, succeeded, failed) = row?;

                    stats.count += count as u64;
                    stats.total_bytes += bytes.max(0) as u64;
                    stats.success_count += succeeded as u64;
                    stats.failure_count += failed as u64;
                    match classification.parse::<Classification>() {
                        Ok(classification) => stats.count_by_classification.add(classification, count as u64),
                        Err(reason) => tracing::warn!(count, "unreadable entries in stats: {}", reason),
                    }
                }
                stats.total_megabytes = to_megabytes(stats.total_bytes);

                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}
