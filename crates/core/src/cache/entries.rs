//! Cache entry CRUD operations.
//!
//! One row per resource URL. Writes replace any existing row for the same
//! URL, so there is never more than one entry per key.

use super::connection::CacheDb;
use crate::Error;
use crate::classify::Classification;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A persisted resource, successful or a recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub url: String,
    /// Retrieved bytes; empty for a recorded failure.
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub classification: Classification,
    pub fetch_succeeded: bool,
    pub cors_failed: bool,
    pub size_bytes: u64,
}

impl CacheEntry {
    /// Entry for a retrieval that produced bytes.
    pub fn success(
        url: impl Into<String>, classification: Classification, payload: Vec<u8>, created_at: DateTime<Utc>,
    ) -> Self {
        let size_bytes = payload.len() as u64;
        Self {
            url: url.into(),
            payload,
            created_at,
            classification,
            fetch_succeeded: true,
            cors_failed: false,
            size_bytes,
        }
    }

    /// Entry recording a failed retrieval.
    pub fn failure(url: impl Into<String>, classification: Classification, created_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            payload: Vec::new(),
            created_at,
            classification,
            fetch_succeeded: false,
            cors_failed: true,
            size_bytes: 0,
        }
    }

    /// Age strictly greater than `ttl` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }

    pub fn is_failure(&self) -> bool {
        !self.fetch_succeeded
    }
}

/// Entry metadata without the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub classification: Classification,
    pub fetch_succeeded: bool,
    pub cors_failed: bool,
    pub size_bytes: u64,
}

/// Raw column values as read from a row.
struct RawRow {
    url: String,
    created_at: i64,
    classification: String,
    fetch_succeeded: bool,
    cors_failed: bool,
    size_bytes: i64,
}

impl RawRow {
    fn into_meta(self) -> Result<EntryMeta, Error> {
        let classification = self
            .classification
            .parse::<Classification>()
            .map_err(|reason| Error::CorruptEntry { url: self.url.clone(), reason })?;
        let created_at = DateTime::from_timestamp_millis(self.created_at).ok_or_else(|| Error::CorruptEntry {
            url: self.url.clone(),
            reason: format!("timestamp out of range: {}", self.created_at),
        })?;

        Ok(EntryMeta {
            url: self.url,
            created_at,
            classification,
            fetch_succeeded: self.fetch_succeeded,
            cors_failed: self.cors_failed,
            size_bytes: self.size_bytes.max(0) as u64,
        })
    }
}

impl CacheDb {
    /// Insert or replace the entry for `entry.url`.
    pub async fn put_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO resources (
                    url, payload, created_at, classification, fetch_succeeded, cors_failed, size_bytes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(url) DO UPDATE SET
                    payload = excluded.payload,
                    created_at = excluded.created_at,
                    classification = excluded.classification,
                    fetch_succeeded = excluded.fetch_succeeded,
                    cors_failed = excluded.cors_failed,
                    size_bytes = excluded.size_bytes",
                    params![
                        &entry.url,
                        &entry.payload,
                        entry.created_at.timestamp_millis(),
                        entry.classification.as_str(),
                        entry.fetch_succeeded as i32,
                        entry.cors_failed as i32,
                        entry.size_bytes as i64,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the entry for a URL.
    ///
    /// Returns None if the URL has no entry.
    pub async fn get_entry(&self, url: &str) -> Result<Option<CacheEntry>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, created_at, classification, fetch_succeeded, cors_failed, size_bytes, payload
                    FROM resources WHERE url = ?1",
                )?;

                let result = stmt.query_row(params![url], |row| {
                    let raw = RawRow {
                        url: row.get(0)?,
                        created_at: row.get(1)?,
                        classification: row.get(2)?,
                        fetch_succeeded: row.get::<_, i32>(3)? == 1,
                        cors_failed: row.get::<_, i32>(4)? == 1,
                        size_bytes: row.get(5)?,
                    };
                    let payload: Vec<u8> = row.get(6)?;
                    Ok((raw, payload))
                });

                let (raw, payload) = match result {
                    Ok(r) => r,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let meta = raw.into_meta()?;
                Ok(Some(CacheEntry {
                    url: meta.url,
                    payload,
                    created_at: meta.created_at,
                    classification: meta.classification,
                    fetch_succeeded: meta.fetch_succeeded,
                    cors_failed: meta.cors_failed,
                    size_bytes: meta.size_bytes,
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the entry for a URL.
    ///
    /// Returns whether an entry was removed.
    pub async fn delete_entry(&self, url: &str) -> Result<bool, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM resources WHERE url = ?1", params![url])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry.
    ///
    /// Returns the number of deleted entries.
    pub async fn delete_all(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM resources", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete recorded failures, leaving successful entries untouched.
    ///
    /// Returns the number of deleted entries.
    pub async fn delete_failed(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM resources WHERE cors_failed = 1", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// List metadata for every entry, oldest first.
    ///
    /// Rows that cannot be decoded are skipped.
    pub async fn list_entries(&self) -> Result<Vec<EntryMeta>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<EntryMeta>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, created_at, classification, fetch_succeeded, cors_failed, size_bytes
                    FROM resources ORDER BY created_at ASC, url ASC",
                )?;

                let rows = stmt.query_map([], |row| {
                    Ok(RawRow {
                        url: row.get(0)?,
                        created_at: row.get(1)?,
                        classification: row.get(2)?,
                        fetch_succeeded: row.get::<_, i32>(3)? == 1,
                        cors_failed: row.get::<_, i32>(4)? == 1,
                        size_bytes: row.get(5)?,
                    })
                })?;

                let mut entries = Vec::new();
                for row in rows {
                    match row?.into_meta() {
                        Ok(meta) => entries.push(meta),
                        Err(e) => tracing::warn!("skipping unreadable cache entry: {}", e),
                    }
                }
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }
}
