//! Persistent Store Module
//!
//! Second cache tier. Wraps a durable key-value backend and confines the
//! cache to keys carrying a namespace prefix, so unrelated application data
//! in the same backend is never touched.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::cache::CacheEntry;
use crate::error::Result;

// == Backend Trait ==
/// Asynchronous durable key-value backend.
///
/// Keys passed here are raw keys: the cache prefix is already applied.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Writes `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: String) -> Result<()>;

    /// Reads the value under `key`.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Lists every key held by the backend, cache or not.
    async fn all_keys(&self) -> Result<Vec<String>>;

    /// Removes every key in `keys`.
    async fn multi_remove(&self, keys: &[String]) -> Result<()>;
}

// == Persistent Store ==
/// Namespacing adapter over a [`KeyValueStore`].
///
/// `set`, `delete` and `multi_delete` log failures and report them as
/// `false`; reads hand backend errors back to the manager, which treats them
/// as misses.
///
/// The namespace is a plain string prefix, so a prefix that starts another
/// prefix in use on the same backend also claims that namespace's keys.
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl PersistentStore {
    // == Constructor ==
    pub fn new(backend: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    /// The namespace prefix applied to every cache key.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Maps a cache key to its raw backend key.
    pub fn raw_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Maps a raw backend key back to a cache key, if it is in the namespace.
    pub fn strip_prefix<'a>(&self, raw_key: &'a str) -> Option<&'a str> {
        raw_key.strip_prefix(self.prefix.as_str())
    }

    // == Get ==
    /// Reads and decodes the entry for `key`.
    ///
    /// A record that fails to decode is logged and reported as absent.
    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let raw = match self.backend.get_item(&self.raw_key(key)).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match CacheEntry::from_record(key, &raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(key, error = %e, "Discarding corrupt persisted cache record");
                Ok(None)
            }
        }
    }

    // == Set ==
    /// Serializes and writes `entry` under `key`.
    pub async fn set(&self, key: &str, entry: &CacheEntry) -> bool {
        let record = match entry.to_record() {
            Ok(record) => record,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache entry");
                return false;
            }
        };

        match self.backend.set_item(&self.raw_key(key), record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Failed to persist cache entry");
                false
            }
        }
    }

    // == Delete ==
    /// Removes the entry for `key`.
    pub async fn delete(&self, key: &str) -> bool {
        match self.backend.remove_item(&self.raw_key(key)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Failed to remove persisted cache entry");
                false
            }
        }
    }

    // == List Keys ==
    /// Raw keys of every persisted cache entry (prefix included).
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let keys = self.backend.all_keys().await?;
        Ok(keys
            .into_iter()
            .filter(|raw| raw.starts_with(self.prefix.as_str()))
            .collect())
    }

    // == Multi Delete ==
    /// Bulk-removes raw keys. An empty batch succeeds without touching the backend.
    pub async fn multi_delete(&self, raw_keys: &[String]) -> bool {
        if raw_keys.is_empty() {
            return true;
        }

        match self.backend.multi_remove(raw_keys).await {
            Ok(()) => true,
            Err(e) => {
                warn!(count = raw_keys.len(), error = %e, "Failed to bulk-remove cache entries");
                false
            }
        }
    }
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryKeyValueStore;
    use serde_json::json;

    fn store() -> (Arc<InMemoryKeyValueStore>, PersistentStore) {
        let backend = Arc::new(InMemoryKeyValueStore::new());
        let persistent = PersistentStore::new(backend.clone(), "@cache_");
        (backend, persistent)
    }

    #[tokio::test]
    async fn test_set_writes_prefixed_record() {
        let (backend, persistent) = store();
        let entry = CacheEntry::new("user_1", json!({"id": 1}), 1_000);

        assert!(persistent.set("user_1", &entry).await);

        let raw = backend.get_item("@cache_user_1").await.unwrap().unwrap();
        let record: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(record["data"], json!({"id": 1}));
        assert_eq!(record["ttl"], json!(1_000));
        assert!(record.get("timestamp").is_some());
    }

    #[tokio::test]
    async fn test_get_restores_key() {
        let (_, persistent) = store();
        let entry = CacheEntry::new("user_1", json!("x"), 1_000);
        persistent.set("user_1", &entry).await;

        let loaded = persistent.get("user_1").await.unwrap().unwrap();
        assert_eq!(loaded, entry);
        assert!(persistent.get("user_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_reads_as_absent() {
        let (backend, persistent) = store();
        backend
            .set_item("@cache_bad", "{not json".to_string())
            .await
            .unwrap();

        assert!(persistent.get("bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_keys_filters_namespace() {
        let (backend, persistent) = store();
        backend.set_item("auth_token", "t".to_string()).await.unwrap();
        persistent
            .set("a", &CacheEntry::new("a", json!(1), 1_000))
            .await;

        let keys = persistent.list_keys().await.unwrap();
        assert_eq!(keys, vec!["@cache_a".to_string()]);
        assert_eq!(persistent.strip_prefix(&keys[0]), Some("a"));
        assert_eq!(persistent.strip_prefix("auth_token"), None);
    }

    #[tokio::test]
    async fn test_delete_and_multi_delete() {
        let (backend, persistent) = store();
        for key in ["a", "b", "c"] {
            persistent
                .set(key, &CacheEntry::new(key, json!(key), 1_000))
                .await;
        }

        assert!(persistent.delete("a").await);
        assert!(persistent.delete("never_there").await);
        assert!(persistent.multi_delete(&[]).await);
        assert!(
            persistent
                .multi_delete(&["@cache_b".to_string(), "@cache_c".to_string()])
                .await
        );
        assert!(backend.all_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_keys_matches_plain_prefix() {
        let backend = Arc::new(InMemoryKeyValueStore::new());
        let general = PersistentStore::new(backend.clone(), "@cache_");
        let images = PersistentStore::new(backend.clone(), "@cache_img_");
        images
            .set("avatar", &CacheEntry::new("avatar", json!("png"), 1_000))
            .await;

        // Nested prefixes are not isolated from each other
        assert_eq!(
            general.list_keys().await.unwrap(),
            vec!["@cache_img_avatar".to_string()]
        );
        assert_eq!(general.strip_prefix("@cache_img_avatar"), Some("img_avatar"));
        assert_eq!(images.list_keys().await.unwrap().len(), 1);
    }
}
