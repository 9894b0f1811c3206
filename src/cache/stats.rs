//! Cache Statistics Module
//!
//! Tier occupancy plus lookup counters (memory hits, persistent hits, misses).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache occupancy and lookup outcomes.
///
/// `total` double-counts a key held by both tiers, matching how
/// pattern deletes count removals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries in the memory tier
    pub memory_count: usize,
    /// Namespaced keys in the persistent tier, stale ones included
    pub persistent_count: usize,
    /// `memory_count + persistent_count`
    pub total: usize,
    /// Lookups answered by the memory tier
    pub memory_hits: u64,
    /// Lookups answered by the persistent tier
    pub persistent_hits: u64,
    /// Lookups answered by neither tier
    pub misses: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate across both tiers.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.persistent_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

// == Lookup Counters ==
/// Lock-free counters updated on every lookup.
#[derive(Debug, Default)]
pub struct LookupCounters {
    memory_hits: AtomicU64,
    persistent_hits: AtomicU64,
    misses: AtomicU64,
}

impl LookupCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistent_hit(&self) {
        self.persistent_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Builds a stats snapshot from the counters and the given tier sizes.
    pub fn snapshot(&self, memory_count: usize, persistent_count: usize) -> CacheStats {
        CacheStats {
            memory_count,
            persistent_count,
            total: memory_count + persistent_count,
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            persistent_hits: self.persistent_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
