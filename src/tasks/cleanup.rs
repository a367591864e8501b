//! Cleanup Tasks
//!
//! Background loops that reclaim expired cache entries:
//! - the memory sweep drops expired L1 entries that are never read again
//! - the durable cleanup deletes expired L2 rows, the only thing that
//!   shrinks the SQLite table

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheManager, MemoryTable};

/// Spawns the L1 sweep loop; it runs until `stop` is cancelled.
pub fn spawn_memory_sweep_task(
    table: Arc<Mutex<MemoryTable>>,
    interval: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Memory sweep loop started with interval {:?}", interval);

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = tokio::time::sleep(interval) => {
                    let removed = table.lock().purge_expired();
                    if removed > 0 {
                        debug!("Memory sweep removed {} expired entries", removed);
                    }
                }
            }
        }

        debug!("Memory sweep loop stopped");
    })
}

/// Spawns the periodic L2 cleanup for `manager`.
///
/// Exits on whichever of `shutdown` (owned by the caller) or `stop` (owned by
/// the manager and cancelled by `close`) fires first. A failed tick is logged
/// and the loop carries on.
pub fn spawn_durable_cleanup_task(
    manager: Arc<CacheManager>,
    interval: Duration,
    shutdown: CancellationToken,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Durable cleanup routine started, interval {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the first sweep
        // happens one interval after startup
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Durable cleanup routine received shutdown signal");
                    break;
                }
                _ = stop.cancelled() => {
                    info!("Durable cleanup routine stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let manager = Arc::clone(&manager);
                    let outcome = tokio::task::spawn_blocking(move || {
                        let removed = manager.cleanup()?;
                        let remaining = manager.stats().sqlite_items;
                        Ok::<_, crate::error::CacheError>((removed, remaining))
                    })
                    .await;

                    match outcome {
                        Ok(Ok((removed, remaining))) => info!(
                            "Durable cleanup removed {} rows, {} live entries remain",
                            removed, remaining
                        ),
                        Ok(Err(err)) => warn!("Durable cleanup failed: {}", err),
                        Err(err) => warn!("Durable cleanup task panicked: {}", err),
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DurableStore;
    use crate::config::CacheConfig;

    fn manager(clean_interval: Duration) -> Arc<CacheManager> {
        let config = CacheConfig::default()
            .with_sqlite_ttl(Duration::ZERO)
            .with_sqlite_clean_interval(clean_interval);
        Arc::new(CacheManager::with_durable(config, DurableStore::in_memory().unwrap()).unwrap())
    }

    #[tokio::test]
    async fn test_memory_sweep_stops_on_cancel() {
        let table = Arc::new(Mutex::new(MemoryTable::new(10)));
        table.lock().set("k", b"v".to_vec(), Duration::ZERO);

        let stop = CancellationToken::new();
        let handle = spawn_memory_sweep_task(table.clone(), Duration::from_millis(10), stop.clone());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(table.lock().is_empty());

        stop.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweep loop should exit after cancel")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_routine_sweeps_expired_rows() {
        let manager = manager(Duration::from_millis(200));
        manager.set("expire_soon", b"v".to_vec()).unwrap();

        let shutdown = CancellationToken::new();
        let handle = manager.start_cleanup_routine(shutdown.clone());

        // Zero-TTL rows become sweepable once the clock passes their second
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(manager.stats().sqlite_items, 0);
        // A manual sweep finds nothing left: the routine got there first
        assert_eq!(manager.cleanup().unwrap(), 0);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("routine should exit on shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_close_stops_routine_without_shutdown_signal() {
        let manager = manager(Duration::from_secs(3600));
        let shutdown = CancellationToken::new();
        let handle = manager.start_cleanup_routine(shutdown.clone());

        manager.close().unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("close should unblock the routine")
            .unwrap();
        assert!(!shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn test_routine_survives_failing_ticks() {
        let manager = manager(Duration::from_millis(20));
        let shutdown = CancellationToken::new();

        // Durable handle gone but manager still running: every tick fails
        manager.durable_for_tests().close().unwrap();
        let handle = manager.start_cleanup_routine(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("routine should exit on shutdown")
            .unwrap();
    }
}
