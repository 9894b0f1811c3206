//! Memory Store Module
//!
//! Process-local first tier. Lookups, inserts and deletes are O(1) and cannot
//! fail; contents vanish when the process exits.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::cache::CacheEntry;

// == Memory Store ==
/// In-process map from cache key to entry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns a copy of the entry held under `key`, stale or not.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    // == Set ==
    /// Stores `entry` under `key`, replacing any existing entry.
    pub fn set(&self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.write().insert(key.into(), entry);
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    // == Keys ==
    /// Snapshot of every key currently held.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    // == Purge Stale ==
    /// Removes every entry that is stale at `now_ms` and returns how many went.
    pub fn purge_stale(&self, now_ms: u64) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid_at(now_ms));
        before - entries.len()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(key: &str, created_at: u64, ttl: u64) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            data: json!(key),
            created_at,
            ttl,
        }
    }

    #[test]
    fn test_memory_set_and_get() {
        let store = MemoryStore::new();
        store.set("a", entry("a", 0, 10));

        assert_eq!(store.get("a").unwrap().data, json!("a"));
        assert!(store.get("b").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_overwrite() {
        let store = MemoryStore::new();
        store.set("a", entry("a", 0, 10));
        store.set("a", entry("a", 5, 99));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().ttl, 99);
    }

    #[test]
    fn test_memory_delete_absent_is_noop() {
        let store = MemoryStore::new();
        assert!(!store.delete("missing"));

        store.set("a", entry("a", 0, 10));
        assert!(store.delete("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_keys_and_clear() {
        let store = MemoryStore::new();
        store.set("a", entry("a", 0, 10));
        store.set("b", entry("b", 0, 10));

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        store.clear();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_memory_purge_stale() {
        let store = MemoryStore::new();
        store.set("old", entry("old", 0, 10));
        store.set("fresh", entry("fresh", 0, 1_000));

        assert_eq!(store.purge_stale(100), 1);
        assert!(store.get("old").is_none());
        assert!(store.get("fresh").is_some());
    }
}
