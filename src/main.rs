//! Tiered Cache - composition root
//!
//! Wires the cache the way an application does at startup: one explicitly
//! constructed `CacheManager` over a file-backed store, shared by `Arc`.
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables
//! 3. Open the file-backed persistent store
//! 4. Create the cache manager and log recovered state
//! 5. Start the background stale sweep (unless disabled)
//! 6. Wait for SIGINT/SIGTERM and stop the sweep

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiered_cache::storage::FileKeyValueStore;
use tiered_cache::{spawn_sweep_task, CacheConfig, CacheManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiered_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tiered cache");

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: storage_dir={}, key_prefix={}, default_ttl={}ms, sweep_interval={}s",
        config.storage_dir.display(),
        config.key_prefix,
        config.default_ttl_ms,
        config.sweep_interval
    );

    let backend = FileKeyValueStore::open(&config.storage_dir)
        .await
        .with_context(|| format!("opening cache store at {}", config.storage_dir.display()))?;
    info!(dir = %backend.directory().display(), "Persistent cache tier ready");

    let cache = Arc::new(CacheManager::from_config(&config, Arc::new(backend)));
    let stats = cache.stats().await;
    info!(
        persistent_entries = stats.persistent_count,
        "Cache manager initialized"
    );

    let sweep_handle = (config.sweep_interval > 0)
        .then(|| spawn_sweep_task(cache.clone(), config.sweep_interval));

    shutdown_signal().await;

    if let Some(handle) = sweep_handle {
        handle.abort();
        warn!("Sweep task aborted");
    }

    let stats = cache.stats().await;
    info!(
        memory_hits = stats.memory_hits,
        persistent_hits = stats.persistent_hits,
        misses = stats.misses,
        "Tiered cache shutdown complete"
    );
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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
