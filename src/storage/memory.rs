//! Volatile key-value backend.
//!
//! Behaves like a durable store for the lifetime of the value, which makes it
//! the backend of choice for tests and throwaway sessions. Read and write
//! faults can be switched on to exercise the cache's soft-failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::cache::KeyValueStore;
use crate::error::{CacheError, Result};

/// `HashMap`-backed [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    items: RwLock<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicU64,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent read (`get_item`, `all_keys`) fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent write (`set_item`, `remove_item`, `multi_remove`) fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `get_item` calls served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Storage("read failure injected".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Storage("write failure injected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        self.check_write()?;
        self.items.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        Ok(self.items.read().get(key).cloned())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.check_write()?;
        self.items.write().remove(key);
        Ok(())
    }

    async fn all_keys(&self) -> Result<Vec<String>> {
        self.check_read()?;
        Ok(self.items.read().keys().cloned().collect())
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<()> {
        self.check_write()?;
        let mut items = self.items.write();
        for key in keys {
            items.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = InMemoryKeyValueStore::new();
        store.set_item("a", "1".to_string()).await.unwrap();

        assert_eq!(store.get_item("a").await.unwrap(), Some("1".to_string()));
        store.remove_item("a").await.unwrap();
        store.remove_item("a").await.unwrap();
        assert_eq!(store.get_item("a").await.unwrap(), None);
        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn test_multi_remove_keeps_others() {
        let store = InMemoryKeyValueStore::new();
        for key in ["a", "b", "c"] {
            store.set_item(key, key.to_string()).await.unwrap();
        }

        store
            .multi_remove(&["a".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(store.all_keys().await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = InMemoryKeyValueStore::new();
        store.set_fail_writes(true);
        assert!(store.set_item("a", "1".to_string()).await.is_err());

        store.set_fail_writes(false);
        store.set_item("a", "1".to_string()).await.unwrap();

        store.set_fail_reads(true);
        assert!(store.get_item("a").await.is_err());
        assert!(store.all_keys().await.is_err());
    }
}
