//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is open.
//!
//! # Tasks
//! - Memory sweep: drops expired L1 entries
//! - Durable cleanup: deletes expired L2 rows at the configured interval

mod cleanup;

pub use cleanup::{spawn_durable_cleanup_task, spawn_memory_sweep_task};
