//! Season Cache - operational server for the two-tier recipe cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use season_cache::api::create_router;
use season_cache::{AppState, CacheManager, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from `.env` and environment variables
/// 3. Open the cache (fatal on failure) and warm the memory layer
/// 4. Start the durable cleanup routine
/// 5. Serve the operational endpoints until SIGINT/SIGTERM
/// 6. Stop the routine and close the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "season_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    info!("Starting Season Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, memory_ttl={}s, memory_max_items={}, sqlite_ttl={}s, sqlite_path={}",
        config.server_port,
        config.cache.memory_ttl.as_secs(),
        config.cache.memory_max_items,
        config.cache.sqlite_ttl.as_secs(),
        config.cache.sqlite_path.display()
    );

    let manager = tokio::task::spawn_blocking({
        let cache_config = config.cache.clone();
        move || CacheManager::open(cache_config)
    })
    .await
    .context("cache initialization task panicked")?
    .context("failed to open cache")?;
    let manager = Arc::new(manager);
    info!("Cache opened");

    let warm = Arc::clone(&manager);
    match tokio::task::spawn_blocking(move || warm.warm_up()).await {
        Ok(Ok(loaded)) => info!("Warm-up loaded {} entries into memory", loaded),
        Ok(Err(err)) => warn!("Warm-up failed: {}", err),
        Err(err) => warn!("Warm-up task failed: {}", err),
    }

    let shutdown = CancellationToken::new();
    let cleanup_handle = manager.start_cleanup_routine(shutdown.clone());
    info!("Durable cleanup routine started");

    let app = create_router(AppState::new(Arc::clone(&manager)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    shutdown.cancel();
    if let Err(err) = cleanup_handle.await {
        warn!("Cleanup routine ended abnormally: {}", err);
    }

    let closing = Arc::clone(&manager);
    match tokio::task::spawn_blocking(move || closing.close()).await {
        Ok(Ok(())) => info!("Cache closed"),
        Ok(Err(err)) => error!("Failed to close cache: {}", err),
        Err(err) => error!("Cache close task failed: {}", err),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
