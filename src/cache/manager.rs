//! Cache Manager Module
//!
//! Two-tier read-through cache: the memory tier answers first, the persistent
//! tier backs it up across restarts, and a caller-supplied producer fills
//! both on a total miss.
//!
//! Storage failures never reach callers. Reads that hit a backend error are
//! misses, writes report `false`. The one hard failure is a producer error,
//! which `fetch_or_populate` hands back unchanged.
//!
//! Concurrent `fetch_or_populate` calls for the same key are not coalesced:
//! each caller that observes a miss runs its own producer and the last write
//! wins.

use std::future::Future;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::stats::LookupCounters;
use crate::cache::{
    ttl, CacheEntry, CacheStats, KeyPattern, KeyValueStore, MemoryStore, PersistentStore,
};
use crate::config::{CacheConfig, DEFAULT_KEY_PREFIX};

// == Options ==
/// Per-call options for `get` and `set`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Skip the persistent tier entirely
    pub memory_only: bool,
}

impl CacheOptions {
    pub fn memory_only() -> Self {
        Self { memory_only: true }
    }
}

// == Set Outcome ==
/// Result of a `set`, reported per tier.
///
/// A memory-only write reports `persistent_ok = true` since nothing was
/// attempted there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOutcome {
    pub memory_ok: bool,
    pub persistent_ok: bool,
}

impl SetOutcome {
    /// True when every attempted tier accepted the write.
    pub fn is_ok(&self) -> bool {
        self.memory_ok && self.persistent_ok
    }
}

// == Preload ==
type ProducerFn = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<Value>> + Send>;

/// One key to warm, with the producer that computes it on a miss.
pub struct PreloadItem {
    pub key: String,
    pub ttl: Option<u64>,
    producer: ProducerFn,
}

impl PreloadItem {
    /// Wraps a typed producer; its output is stored as JSON.
    pub fn new<T, F, Fut>(key: impl Into<String>, ttl: Option<u64>, producer: F) -> Self
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let producer: ProducerFn = Box::new(move || {
            async move {
                let data = producer().await?;
                Ok::<Value, anyhow::Error>(serde_json::to_value(data)?)
            }
            .boxed()
        });

        Self {
            key: key.into(),
            ttl,
            producer,
        }
    }
}

impl std::fmt::Debug for PreloadItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadItem")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// How a `preload` batch settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadSummary {
    pub succeeded: usize,
    pub failed: usize,
}

// == Cache Manager ==
/// Memory tier + persistent tier, owned by the application's composition root.
#[derive(Debug)]
pub struct CacheManager {
    memory: MemoryStore,
    persistent: PersistentStore,
    default_ttl: u64,
    counters: LookupCounters,
}

impl CacheManager {
    // == Constructors ==
    /// Creates a manager over `backend`, namespacing persisted keys with `prefix`.
    ///
    /// # Arguments
    /// * `backend` - Durable key-value store shared with the rest of the app
    /// * `prefix` - Namespace prefix for persisted cache keys
    /// * `default_ttl` - TTL in milliseconds used when a call passes `None`
    ///
    /// Namespaces are plain string prefixes. Managers sharing one backend must
    /// use prefixes where neither starts with the other: a manager on
    /// `@cache_` also lists, pattern-deletes and clears keys written by one on
    /// `@cache_img_`.
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        prefix: impl Into<String>,
        default_ttl: u64,
    ) -> Self {
        Self {
            memory: MemoryStore::new(),
            persistent: PersistentStore::new(backend, prefix),
            default_ttl,
            counters: LookupCounters::new(),
        }
    }

    /// Creates a manager with the default prefix and `ttl::DEFAULT`.
    pub fn with_backend(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::new(backend, DEFAULT_KEY_PREFIX, ttl::DEFAULT)
    }

    /// Creates a manager from configuration.
    pub fn from_config(config: &CacheConfig, backend: Arc<dyn KeyValueStore>) -> Self {
        Self::new(backend, config.key_prefix.clone(), config.default_ttl_ms)
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    pub fn prefix(&self) -> &str {
        self.persistent.prefix()
    }

    // == Get ==
    /// Returns the cached value for `key`, consulting both tiers.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_with(key, CacheOptions::default()).await
    }

    /// Returns the cached value for `key`.
    ///
    /// A payload that cannot be decoded as `T` is logged and treated as absent.
    pub async fn get_with<T: DeserializeOwned>(
        &self,
        key: &str,
        options: CacheOptions,
    ) -> Option<T> {
        let data = self.lookup(key, options).await?;
        match serde_json::from_value(data) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Cached payload does not match requested type");
                None
            }
        }
    }

    async fn lookup(&self, key: &str, options: CacheOptions) -> Option<Value> {
        if let Some(entry) = self.memory.get(key) {
            if entry.is_valid() {
                self.counters.record_memory_hit();
                debug!(key, "Memory cache hit");
                return Some(entry.data);
            }
            debug!(key, "Evicting stale memory entry");
            self.memory.delete(key);
        }

        if options.memory_only {
            self.counters.record_miss();
            return None;
        }

        match self.persistent.get(key).await {
            Ok(Some(entry)) if entry.is_valid() => {
                self.counters.record_persistent_hit();
                debug!(key, "Persistent cache hit, promoting to memory");
                let data = entry.data.clone();
                self.memory.set(key, entry);
                Some(data)
            }
            Ok(Some(_)) => {
                debug!(key, "Evicting stale persistent entry");
                self.persistent.delete(key).await;
                self.counters.record_miss();
                None
            }
            Ok(None) => {
                self.counters.record_miss();
                None
            }
            Err(e) => {
                warn!(key, error = %e, "Persistent cache read failed, treating as miss");
                self.counters.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores `data` under `key` in both tiers.
    ///
    /// `ttl` is in milliseconds; `None` uses the manager's default.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        ttl: Option<u64>,
    ) -> SetOutcome {
        self.set_with(key, data, ttl, CacheOptions::default()).await
    }

    /// Stores `data` under `key`. The memory tier is always written.
    pub async fn set_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        ttl: Option<u64>,
        options: CacheOptions,
    ) -> SetOutcome {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache payload");
                return SetOutcome {
                    memory_ok: false,
                    persistent_ok: false,
                };
            }
        };

        let entry = CacheEntry::new(key, data, ttl.unwrap_or(self.default_ttl));
        self.memory.set(key, entry.clone());

        let persistent_ok = options.memory_only || self.persistent.set(key, &entry).await;

        SetOutcome {
            memory_ok: true,
            persistent_ok,
        }
    }

    // == Delete ==
    /// Removes `key` from both tiers. Deleting an absent key succeeds.
    pub async fn delete(&self, key: &str) -> bool {
        self.memory.delete(key);
        self.persistent.delete(key).await
    }

    // == Delete By Pattern ==
    /// Removes every key matching the wildcard `pattern` from both tiers.
    ///
    /// Returns memory matches plus persistent matches, so a key held by both
    /// tiers counts twice. If the persistent tier cannot be listed or bulk
    /// removal fails, only memory removals are counted.
    pub async fn delete_by_pattern(&self, pattern: &str) -> usize {
        let pattern = match KeyPattern::new(pattern) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!(error = %e, "Rejected cache invalidation pattern");
                return 0;
            }
        };

        let mut removed = 0;
        for key in self.memory.keys() {
            if pattern.matches(&key) && self.memory.delete(&key) {
                removed += 1;
            }
        }

        match self.persistent.list_keys().await {
            Ok(raw_keys) => {
                let matched: Vec<String> = raw_keys
                    .into_iter()
                    .filter(|raw| {
                        self.persistent
                            .strip_prefix(raw)
                            .is_some_and(|key| pattern.matches(key))
                    })
                    .collect();

                if self.persistent.multi_delete(&matched).await {
                    removed += matched.len();
                }
            }
            Err(e) => {
                warn!(
                    pattern = pattern.as_str(),
                    error = %e,
                    "Failed to list persisted cache keys"
                );
            }
        }

        debug!(pattern = pattern.as_str(), removed, "Pattern invalidation complete");
        removed
    }

    // == Clear ==
    /// Empties the memory tier and removes every namespaced persisted key.
    ///
    /// Persisted data outside the namespace is left alone.
    pub async fn clear_all(&self) -> bool {
        self.memory.clear();

        match self.persistent.list_keys().await {
            Ok(raw_keys) => {
                let cleared = self.persistent.multi_delete(&raw_keys).await;
                if cleared {
                    info!(count = raw_keys.len(), "Cache cleared");
                }
                cleared
            }
            Err(e) => {
                warn!(error = %e, "Failed to list persisted cache keys during clear");
                false
            }
        }
    }

    /// Drops the memory tier only, as a process restart would.
    pub fn clear_memory(&self) {
        self.memory.clear();
    }

    // == Stats ==
    /// Returns tier occupancy and lookup counters.
    pub async fn stats(&self) -> CacheStats {
        let persistent_count = match self.persistent.list_keys().await {
            Ok(keys) => keys.len(),
            Err(e) => {
                warn!(error = %e, "Failed to count persisted cache keys");
                0
            }
        };

        self.counters.snapshot(self.memory.len(), persistent_count)
    }

    // == Fetch Or Populate ==
    /// Returns the cached value for `key`, or runs `producer` and caches its result.
    ///
    /// A producer error is returned unchanged and nothing is cached. A failed
    /// cache write does not affect the returned value.
    pub async fn fetch_or_populate<T, E, F, Fut>(
        &self,
        key: &str,
        producer: F,
        ttl: Option<u64>,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            return Ok(hit);
        }

        let result = producer().await?;

        let outcome = self.set(key, &result, ttl).await;
        if !outcome.is_ok() {
            debug!(key, ?outcome, "Fetched value was not fully cached");
        }

        Ok(result)
    }

    // == Preload ==
    /// Runs `fetch_or_populate` for every item concurrently.
    ///
    /// Failures are logged per item and never abort the batch; this returns
    /// once every item has settled.
    pub async fn preload(&self, items: Vec<PreloadItem>) -> PreloadSummary {
        let attempts = items.into_iter().map(|item| async move {
            let PreloadItem { key, ttl, producer } = item;
            let outcome = self.fetch_or_populate(&key, producer, ttl).await;
            (key, outcome)
        });

        let mut summary = PreloadSummary::default();
        for (key, outcome) in join_all(attempts).await {
            match outcome {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    warn!(key = %key, error = %e, "Preload failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Preload settled"
        );
        summary
    }

    // == Purge Expired ==
    /// Removes every stale entry from both tiers and returns how many went.
    ///
    /// Unreadable persisted records are removed as well. Persisted candidates
    /// are re-read right before the bulk removal, so an entry rewritten after
    /// the scan is kept. A write landing between that re-read and the removal
    /// can still be lost, the same last-writer race as concurrent `set`s.
    pub async fn purge_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut removed = self.memory.purge_stale(now);

        let raw_keys = match self.persistent.list_keys().await {
            Ok(raw_keys) => raw_keys,
            Err(e) => {
                warn!(error = %e, "Failed to list persisted cache keys during purge");
                return removed;
            }
        };

        let mut candidates = Vec::new();
        for raw in raw_keys {
            if self.persisted_is_purgeable(&raw, now).await {
                candidates.push(raw);
            }
        }

        let mut stale = Vec::with_capacity(candidates.len());
        for raw in candidates {
            if self.persisted_is_purgeable(&raw, current_timestamp_ms()).await {
                stale.push(raw);
            } else {
                debug!(raw_key = %raw, "Entry rewritten during purge, keeping it");
            }
        }

        if self.persistent.multi_delete(&stale).await {
            removed += stale.len();
        }
        removed
    }

    async fn persisted_is_purgeable(&self, raw_key: &str, now_ms: u64) -> bool {
        let Some(key) = self.persistent.strip_prefix(raw_key) else {
            return false;
        };

        match self.persistent.get(key).await {
            Ok(Some(entry)) => !entry.is_valid_at(now_ms),
            Ok(None) => true,
            Err(e) => {
                debug!(key, error = %e, "Skipping unreadable entry during purge");
                false
            }
        }
    }
}
