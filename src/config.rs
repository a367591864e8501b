//! Configuration Module
//!
//! Loads server and cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Two-tier cache settings
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - see [`CacheConfig::from_env`] for the cache variables
    pub fn from_env() -> Self {
        Self {
            server_port: env_or("SERVER_PORT", 8080),
            cache: CacheConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            cache: CacheConfig::default(),
        }
    }
}

/// Two-tier cache configuration. Immutable once a manager is built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of an L1 (memory) entry
    pub memory_ttl: Duration,
    /// Capacity bound of the L1 table
    pub memory_max_items: usize,
    /// How often the L1 sweep loop drops expired entries
    pub memory_sweep_interval: Duration,
    /// Lifetime of an L2 (SQLite) row
    pub sqlite_ttl: Duration,
    /// How often expired L2 rows are deleted
    pub sqlite_clean_interval: Duration,
    /// Location of the SQLite file
    pub sqlite_path: PathBuf,
}

impl CacheConfig {
    /// Loads the cache settings from the environment.
    ///
    /// # Environment Variables
    /// Durations are whole seconds.
    /// - `CACHE_MEMORY_TTL` (default: 3600)
    /// - `CACHE_MEMORY_MAX_ITEMS` (default: 1000)
    /// - `CACHE_MEMORY_SWEEP_INTERVAL` (default: 1)
    /// - `CACHE_SQLITE_TTL` (default: 604800)
    /// - `CACHE_SQLITE_CLEAN_INTERVAL` (default: 3600)
    /// - `CACHE_SQLITE_PATH` (default: ./data/cache.db)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            memory_ttl: secs_or("CACHE_MEMORY_TTL", defaults.memory_ttl),
            memory_max_items: env_or("CACHE_MEMORY_MAX_ITEMS", defaults.memory_max_items),
            memory_sweep_interval: secs_or(
                "CACHE_MEMORY_SWEEP_INTERVAL",
                defaults.memory_sweep_interval,
            ),
            sqlite_ttl: secs_or("CACHE_SQLITE_TTL", defaults.sqlite_ttl),
            sqlite_clean_interval: secs_or(
                "CACHE_SQLITE_CLEAN_INTERVAL",
                defaults.sqlite_clean_interval,
            ),
            sqlite_path: env::var("CACHE_SQLITE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.sqlite_path),
        }
    }

    /// Rejects settings the manager cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.memory_max_items == 0 {
            return Err(CacheError::InvalidConfig(
                "memory_max_items must be greater than zero".to_string(),
            ));
        }
        if self.memory_sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "memory_sweep_interval must be greater than zero".to_string(),
            ));
        }
        if self.sqlite_clean_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sqlite_clean_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_memory_ttl(mut self, ttl: Duration) -> Self {
        self.memory_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_memory_max_items(mut self, max_items: usize) -> Self {
        self.memory_max_items = max_items;
        self
    }

    #[must_use]
    pub fn with_memory_sweep_interval(mut self, interval: Duration) -> Self {
        self.memory_sweep_interval = interval;
        self
    }

    #[must_use]
    pub fn with_sqlite_ttl(mut self, ttl: Duration) -> Self {
        self.sqlite_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_sqlite_clean_interval(mut self, interval: Duration) -> Self {
        self.sqlite_clean_interval = interval;
        self
    }

    #[must_use]
    pub fn with_sqlite_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sqlite_path = path.into();
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_ttl: Duration::from_secs(60 * 60),
            memory_max_items: 1000,
            memory_sweep_interval: Duration::from_secs(1),
            sqlite_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            sqlite_clean_interval: Duration::from_secs(60 * 60),
            sqlite_path: PathBuf::from("./data/cache.db"),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn secs_or(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
