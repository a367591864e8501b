//! Cache Statistics Module
//!
//! L1 counters and the manager-wide snapshot served by the stats endpoint.

use std::time::Duration;

use serde::{Serialize, Serializer};

// == Memory Stats ==
/// Counters kept by the L1 table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Lookups answered from memory
    pub hits: u64,
    /// Lookups that found nothing (or only an expired entry)
    pub misses: u64,
    /// Entries dropped to make room under the capacity bound
    pub evictions: u64,
    /// Entries dropped because their TTL ran out
    pub expired: u64,
    /// Current number of entries
    pub total_entries: usize,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Cache Stats ==
/// Point-in-time view of both layers.
///
/// Not transactional: concurrent writers may change the counts while the
/// snapshot is being assembled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub memory_items: usize,
    pub sqlite_items: usize,
    #[serde(rename = "memoryTTL", serialize_with = "as_secs")]
    pub memory_ttl: Duration,
    #[serde(rename = "sqliteTTL", serialize_with = "as_secs")]
    pub sqlite_ttl: Duration,
    pub memory_hits: u64,
    pub memory_misses: u64,
    pub memory_evictions: u64,
    /// Memory hits over memory lookups, 0.0 before the first lookup
    pub memory_hit_rate: f64,
    /// Reads served by promoting a durable row
    pub durable_hits: u64,
    /// Durable reads that failed and were reported as misses
    pub durable_read_errors: u64,
}

fn as_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}
