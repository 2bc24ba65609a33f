//! Student API server binary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use student_api::cache::{Cache, MemoryCache, RedisCache};
use student_api::storage::SqliteStorage;
use student_api::tasks::bounded;
use student_api::{create_router, spawn_cleanup_task, AppState, CacheBackend, Config};

/// How long startup waits for the first Redis connection.
const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Main entry point for the student API server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the SQLite store and apply migrations
/// 4. Connect the cache (Redis, falling back to the in-process cache)
/// 5. Create Axum router with all endpoints
/// 6. Serve until SIGINT/SIGTERM, then drain within the grace period
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "student_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        env = %config.env,
        storage = %config.storage_path,
        cache_backend = ?config.cache_backend,
        cache_ttl = config.cache_ttl,
        "Configuration loaded"
    );

    let storage = Arc::new(
        SqliteStorage::connect(&config.storage_path, config.db_max_connections)
            .await
            .context("failed to open SQLite storage")?,
    );
    info!(env = %config.env, "SQLite connected successfully");

    let (cache, cleanup_handle) = connect_cache(&config).await;

    let state = AppState::new(storage.clone(), cache, config.cache_settings());
    let app = create_router(state, Duration::from_secs(config.request_timeout));

    let listener = TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;
    info!("Server listening on http://{}", listener.local_addr()?);

    // Flips to true once a shutdown signal arrives
    let (signal_tx, mut signal_rx) = watch::channel(false);
    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signal_tx.send(true);
            })
            .await
    };
    let grace = Duration::from_secs(config.shutdown_grace);
    let grace_elapsed = async move {
        if signal_rx.wait_for(|fired| *fired).await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result.context("server error")?,
        _ = grace_elapsed => warn!("Shutdown grace period elapsed, dropping in-flight requests"),
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
    storage.close().await;

    info!("Server exited properly");
    Ok(())
}

/// Builds the configured cache backend.
///
/// An unreachable Redis is logged and replaced by the in-process cache: the
/// cache is an optimization, never a reason to refuse traffic. The sweeper
/// handle is returned only for the in-process backend.
async fn connect_cache(config: &Config) -> (Arc<dyn Cache>, Option<JoinHandle<()>>) {
    if config.cache_backend == CacheBackend::Redis {
        match bounded(REDIS_CONNECT_TIMEOUT, RedisCache::connect(&config.redis_addr)).await {
            Ok(cache) => {
                info!(addr = %config.redis_addr, "Redis connected successfully");
                return (Arc::new(cache), None);
            }
            Err(e) => error!(
                addr = %config.redis_addr,
                error = %e,
                "Redis connection failed, falling back to in-process cache"
            ),
        }
    }

    let cache = MemoryCache::new(config.cache_max_entries);
    let cleanup_handle = spawn_cleanup_task(cache.clone(), config.cleanup_interval);
    info!(
        max_entries = config.cache_max_entries,
        "In-process cache initialized"
    );
    (Arc::new(cache), Some(cleanup_handle))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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
