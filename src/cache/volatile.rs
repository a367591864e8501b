//! Volatile (L1) Store
//!
//! Bounded in-memory table with per-entry TTL and LRU eviction, plus the
//! handle that owns its background sweep loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{LruTracker, MemoryEntry, MemoryStats};
use crate::tasks::spawn_memory_sweep_task;

// == Memory Table ==
/// The L1 table itself. Not synchronized; [`VolatileStore`] wraps it in a lock.
#[derive(Debug)]
pub struct MemoryTable {
    /// Key-value storage
    entries: HashMap<String, MemoryEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: MemoryStats,
    /// Capacity bound
    max_entries: usize,
}

impl MemoryTable {
    /// Creates an empty table holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: MemoryStats::new(),
            max_entries,
        }
    }

    // == Set ==
    /// Upserts `key` with its own TTL.
    ///
    /// Overwriting resets the TTL. Inserting a new key into a full table
    /// evicts the least recently used key first. A zero-capacity table stores
    /// nothing.
    pub fn set(&mut self, key: &str, value: Vec<u8>, ttl: Duration) {
        if self.max_entries == 0 {
            return;
        }

        let is_overwrite = self.entries.contains_key(key);
        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted_key) = self.lru.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
            }
        }

        self.entries
            .insert(key.to_string(), MemoryEntry::new(value, ttl));
        self.lru.touch(key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns a copy of the value if present and not expired.
    ///
    /// An expired entry is removed on the spot and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expired(1);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Delete ==
    /// Removes `key`; returns whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(MemoryEntry::ttl_remaining)
    }

    // == Purge Expired ==
    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expired(expired_keys.len());
        expired_keys.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
    }

    pub fn stats(&self) -> MemoryStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }
}

// == Volatile Store ==
/// Thread-safe L1 store with a background sweep loop.
///
/// The sweep loop reclaims memory from expired entries that are never read
/// again. It must be running on a Tokio runtime; see [`VolatileStore::start`].
#[derive(Debug)]
pub struct VolatileStore {
    table: Arc<Mutex<MemoryTable>>,
    sweep_interval: Duration,
    sweeper: Mutex<Option<Sweeper>>,
}

#[derive(Debug)]
struct Sweeper {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl VolatileStore {
    pub fn new(max_entries: usize, sweep_interval: Duration) -> Self {
        Self {
            table: Arc::new(Mutex::new(MemoryTable::new(max_entries))),
            sweep_interval,
            sweeper: Mutex::new(None),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.table.lock().get(key)
    }

    pub fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.table.lock().set(key, value, ttl);
    }

    pub fn delete(&self, key: &str) -> bool {
        self.table.lock().delete(key)
    }

    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.table.lock().ttl_remaining(key)
    }

    pub fn purge_expired(&self) -> usize {
        self.table.lock().purge_expired()
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    pub fn clear(&self) {
        self.table.lock().clear();
    }

    pub fn stats(&self) -> MemoryStats {
        self.table.lock().stats()
    }

    // == Start ==
    /// Starts the sweep loop on the current Tokio runtime.
    ///
    /// Returns `false` when the loop could not be started because no runtime
    /// is available or the sweep interval is zero; the store still works,
    /// expired entries are then only dropped when read. Calling `start` on a
    /// running store is a no-op.
    pub fn start(&self) -> bool {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return true;
        }

        if self.sweep_interval.is_zero() {
            warn!("Memory sweep interval is zero, sweep loop not started");
            return false;
        }

        if Handle::try_current().is_err() {
            warn!("No Tokio runtime available, memory sweep loop not started");
            return false;
        }

        let stop = CancellationToken::new();
        let handle = spawn_memory_sweep_task(self.table.clone(), self.sweep_interval, stop.clone());
        *sweeper = Some(Sweeper { stop, handle });
        true
    }

    // == Stop ==
    /// Halts the sweep loop. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.stop.cancel();
            debug!("Memory sweep loop stop requested");
            drop(sweeper.handle);
        }
    }

    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|sweeper| !sweeper.handle.is_finished())
    }
}

impl Drop for VolatileStore {
    fn drop(&mut self) {
        self.stop();
    }
}
