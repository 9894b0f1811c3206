//! Stale Entry Sweep Task
//!
//! Background task that periodically removes stale entries from both tiers.
//! Reads already evict stale entries lazily; the sweep bounds how long
//! entries nobody reads again keep occupying memory and disk.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheManager;

/// Spawns a background task that periodically purges stale cache entries.
///
/// # Arguments
/// * `cache` - Shared cache manager
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheManager::with_backend(backend));
/// let sweep_handle = spawn_sweep_task(cache.clone(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: Arc<CacheManager>, sweep_interval_secs: u64) -> JoinHandle<()> {
    spawn_sweep_task_every(cache, Duration::from_secs(sweep_interval_secs))
}

pub(crate) fn spawn_sweep_task_every(
    cache: Arc<CacheManager>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting stale cache sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;

            if removed > 0 {
                info!("Cache sweep: removed {} stale entries", removed);
            } else {
                debug!("Cache sweep: no stale entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryKeyValueStore;

    fn cache() -> (Arc<InMemoryKeyValueStore>, Arc<CacheManager>) {
        let backend = Arc::new(InMemoryKeyValueStore::new());
        let cache = Arc::new(CacheManager::with_backend(backend.clone()));
        (backend, cache)
    }

    #[tokio::test]
    async fn test_sweep_task_removes_stale_entries() {
        let (backend, cache) = cache();
        cache.set("expire_soon", "value", Some(20)).await;

        let handle = spawn_sweep_task_every(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        let stats = cache.stats().await;
        assert_eq!(stats.memory_count, 0, "Stale memory entry should be swept");
        assert_eq!(stats.persistent_count, 0, "Stale persisted entry should be swept");
        assert!(backend.is_empty());

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let (_, cache) = cache();
        cache.set("long_lived", "value", Some(60_000)).await;

        let handle = spawn_sweep_task_every(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(
            cache.get::<String>("long_lived").await,
            Some("value".to_string())
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let (_, cache) = cache();

        let handle = spawn_sweep_task(cache, 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
