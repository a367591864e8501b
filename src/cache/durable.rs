//! Durable (L2) Store
//!
//! SQLite-backed key/value table with absolute expiry timestamps. Survives
//! restarts; expired rows stay on disk until [`DurableStore::cleanup`] runs
//! but are never returned by reads.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::types::{FromSqlError, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS cache_entries (
        key         TEXT PRIMARY KEY,
        value       BLOB NOT NULL,
        expires_at  INTEGER NOT NULL,
        created_at  INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_expires_at ON cache_entries(expires_at);
"#;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One row of `cache_entries`. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub expires_at: i64,
    /// Time of the latest write, not the first one
    pub created_at: i64,
}

/// Durable cache table.
///
/// A single connection sits behind one lock, so writes are serialized and a
/// read never observes a half-applied write. `None` means the handle has been
/// closed; every operation then fails with [`CacheError::Closed`].
pub struct DurableStore {
    conn: Mutex<Option<Connection>>,
}

impl DurableStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        // WAL + NORMAL: a crash may drop the last few commits but never the file
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch("PRAGMA synchronous=NORMAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        debug!("Durable cache journal mode: {}", journal_mode);

        let store = Self::init(conn)?;
        info!("Durable cache opened at {}", path.display());
        Ok(store)
    }

    /// Creates a store that lives only as long as this value (for tests).
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(CacheError::Closed)?;
        Ok(f(conn)?)
    }

    /// Returns the value if the row exists and has not expired.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = now_secs();
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM cache_entries WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| value_bytes(row, 0),
            )
            .optional()
        })
    }

    /// Returns the full row if it exists and has not expired.
    pub fn entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let now = now_secs();
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT key, value, expires_at, created_at FROM cache_entries
                 WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| {
                    Ok(CacheEntry {
                        key: row.get(0)?,
                        value: value_bytes(row, 1)?,
                        expires_at: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Upserts a row expiring `ttl` from now. TTLs are truncated to whole
    /// seconds; `created_at` is restamped on every overwrite.
    pub fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let now = now_secs();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = now.saturating_add(ttl_secs);

        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cache_entries (key, value, expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![key, value, expires_at, now],
            )
        })?;
        Ok(())
    }

    /// Removes the row. Deleting a missing key is not an error.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key]))?;
        Ok(())
    }

    /// Deletes every row whose expiry is in the past; returns the row count.
    pub fn cleanup(&self) -> Result<usize> {
        let now = now_secs();
        let removed = self.with_conn(|conn| {
            conn.execute("DELETE FROM cache_entries WHERE expires_at < ?1", params![now])
        })?;
        debug!("Durable cleanup removed {} rows", removed);
        Ok(removed)
    }

    /// Number of rows that have not expired.
    pub fn count(&self) -> Result<usize> {
        let now = now_secs();
        let count: i64 = self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM cache_entries WHERE expires_at > ?1",
                params![now],
                |row| row.get(0),
            )
        })?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Every non-expired row, keyed by cache key. Used for warm-up.
    ///
    /// Rows that cannot be decoded are logged and skipped.
    pub fn get_all(&self) -> Result<HashMap<String, Vec<u8>>> {
        let now = now_secs();
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT key, value FROM cache_entries WHERE expires_at > ?1")?;
            let rows = stmt.query_map(params![now], |row| {
                Ok((row.get::<_, String>(0)?, value_bytes(row, 1)?))
            })?;

            let mut all = HashMap::new();
            for row in rows {
                match row {
                    Ok((key, value)) => {
                        all.insert(key, value);
                    }
                    Err(err) => warn!("Skipping unreadable durable row: {}", err),
                }
            }
            Ok(all)
        })
    }

    /// Releases the connection. A second call is a no-op.
    pub fn close(&self) -> Result<()> {
        let conn = self.conn.lock().take();
        match conn {
            Some(conn) => conn.close().map_err(|(_, err)| CacheError::Storage(err)),
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Reads a payload column. TEXT values written by other tools are accepted
/// as their UTF-8 bytes.
fn value_bytes(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<u8>> {
    match row.get_ref(idx)? {
        ValueRef::Blob(bytes) | ValueRef::Text(bytes) => Ok(bytes.to_vec()),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            idx,
            other.data_type(),
            Box::new(FromSqlError::InvalidType),
        )),
    }
}

fn now_secs() -> i64 {
    Utc::now().timestamp()
}
