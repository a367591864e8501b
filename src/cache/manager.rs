//! Cache Manager
//!
//! Layers the volatile store (L1) over the durable store (L2):
//! - reads check L1 first, then L2, promoting L2 hits into L1 with the
//!   memory TTL
//! - writes go to L1 then L2; an L2 failure is reported but L1 keeps the value
//! - warm-up copies every live L2 row into L1 at startup
//! - a cleanup routine periodically deletes expired L2 rows
//!
//! Lifecycle: `open` -> running -> `close` (terminal). After close, reads
//! report misses and writes fail with [`CacheError::Closed`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, DurableStore, VolatileStore};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_durable_cleanup_task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Running,
    Closed,
}

/// Two-tier cache shared by every request handler (usually as `Arc<CacheManager>`).
#[derive(Debug)]
pub struct CacheManager {
    config: CacheConfig,
    memory: VolatileStore,
    durable: DurableStore,
    /// Closed flag, separate from the durable connection lock
    lifecycle: Mutex<Lifecycle>,
    /// Internal stop signal for the cleanup routine, independent of any
    /// caller-supplied token
    stop: CancellationToken,
    durable_hits: AtomicU64,
    durable_read_errors: AtomicU64,
}

impl CacheManager {
    /// Opens the durable store at `config.sqlite_path` and builds the memory
    /// layer. Fails if the config is invalid or the store cannot be opened.
    ///
    /// The memory sweep loop starts immediately when called inside a Tokio
    /// runtime.
    pub fn open(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let durable = DurableStore::open(&config.sqlite_path)?;
        Self::with_durable(config, durable)
    }

    /// Builds a manager over an already opened durable store.
    ///
    /// Fails with [`CacheError::InvalidConfig`] if the config is rejected by
    /// [`CacheConfig::validate`].
    pub fn with_durable(config: CacheConfig, durable: DurableStore) -> Result<Self> {
        config.validate()?;
        let memory = VolatileStore::new(config.memory_max_items, config.memory_sweep_interval);
        memory.start();

        info!(
            "Cache manager ready: memory_ttl={:?}, memory_max_items={}, sqlite_ttl={:?}",
            config.memory_ttl, config.memory_max_items, config.sqlite_ttl
        );

        Ok(Self {
            config,
            memory,
            durable,
            lifecycle: Mutex::new(Lifecycle::Running),
            stop: CancellationToken::new(),
            durable_hits: AtomicU64::new(0),
            durable_read_errors: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        *self.lifecycle.lock() == Lifecycle::Closed
    }

    #[cfg(test)]
    pub(crate) fn durable_for_tests(&self) -> &DurableStore {
        &self.durable
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    // == Get ==
    /// Read-through lookup: L1, then L2 with promotion.
    ///
    /// Durable read failures are logged, counted and reported as a miss. A
    /// handle closed underneath the read is a plain miss.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        if self.is_closed() {
            debug!("Cache read after close: {}", key);
            return None;
        }

        if let Some(value) = self.memory.get(key) {
            return Some(value);
        }

        match self.durable.get(key) {
            Ok(Some(value)) => {
                // Promotion uses the memory TTL, never the remaining durable window
                self.memory.set(key, value.clone(), self.config.memory_ttl);
                self.durable_hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Ok(None) => None,
            Err(CacheError::Closed) => {
                debug!("Durable handle closed during read: {}", key);
                None
            }
            Err(err) => {
                self.durable_read_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Durable cache read failed for {}: {}", key, err);
                None
            }
        }
    }

    // == Set ==
    /// Write-through to both layers.
    ///
    /// No rollback: if the durable write fails, the error is returned while
    /// the memory layer keeps the new value.
    pub fn set(&self, key: &str, value: impl Into<Vec<u8>>) -> Result<()> {
        self.ensure_open()?;
        let value = value.into();

        self.memory.set(key, value.clone(), self.config.memory_ttl);
        self.durable.set(key, &value, self.config.sqlite_ttl)
    }

    // == Delete ==
    /// Removes `key` from memory unconditionally, then from the durable store.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.ensure_open()?;
        self.memory.delete(key);
        self.durable.delete(key)
    }

    // == JSON Helpers ==
    /// Looks up `key` and decodes it as `T`.
    ///
    /// A payload that does not decode is treated as a miss so callers
    /// recompute and overwrite it.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!("Cached payload for {} did not decode: {}", key, err);
                None
            }
        }
    }

    /// Encodes `value` as JSON and writes it through both layers.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes)
    }

    // == Warm Up ==
    /// Loads every live durable row into memory with the memory TTL.
    ///
    /// On error the manager keeps working and fills memory lazily on reads.
    pub fn warm_up(&self) -> Result<usize> {
        self.ensure_open()?;
        info!("Cache warm-up started");

        let rows = self.durable.get_all()?;
        let loaded = rows.len();
        for (key, value) in rows {
            self.memory.set(&key, value, self.config.memory_ttl);
        }

        info!("Cache warm-up finished, loaded {} entries", loaded);
        Ok(loaded)
    }

    // == Cleanup ==
    /// One durable sweep: deletes expired rows and returns how many went.
    pub fn cleanup(&self) -> Result<usize> {
        self.ensure_open()?;
        self.durable.cleanup()
    }

    /// Spawns the periodic durable cleanup on the current Tokio runtime.
    ///
    /// The loop ends when `shutdown` is cancelled or when [`close`](Self::close)
    /// runs, whichever happens first.
    pub fn start_cleanup_routine(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        spawn_durable_cleanup_task(
            Arc::clone(self),
            self.config.sqlite_clean_interval,
            shutdown,
            self.stop.clone(),
        )
    }

    // == Stats ==
    /// Point-in-time counts for both layers.
    pub fn stats(&self) -> CacheStats {
        let memory = self.memory.stats();
        let sqlite_items = match self.durable.count() {
            Ok(count) => count,
            Err(err) => {
                debug!("Durable count unavailable: {}", err);
                0
            }
        };

        CacheStats {
            memory_items: memory.total_entries,
            sqlite_items,
            memory_ttl: self.config.memory_ttl,
            sqlite_ttl: self.config.sqlite_ttl,
            memory_hits: memory.hits,
            memory_misses: memory.misses,
            memory_evictions: memory.evictions,
            memory_hit_rate: memory.hit_rate(),
            durable_hits: self.durable_hits.load(Ordering::Relaxed),
            durable_read_errors: self.durable_read_errors.load(Ordering::Relaxed),
        }
    }

    // == Close ==
    /// Stops the background loops and closes the durable handle.
    ///
    /// Only the first call does anything; later calls return `Ok(())`.
    pub fn close(&self) -> Result<()> {
        {
            let mut lifecycle = self.lifecycle.lock();
            if *lifecycle == Lifecycle::Closed {
                return Ok(());
            }
            *lifecycle = Lifecycle::Closed;
        }

        self.stop.cancel();
        self.memory.stop();
        self.memory.clear();
        let result = self.durable.close();
        info!("Cache manager closed");
        result
    }
}
