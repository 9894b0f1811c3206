//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with payload and metadata.
///
/// Persisted as `{"data": ..., "timestamp": ..., "ttl": ...}`; the key lives
/// in the storage key and is restored by the persistent adapter on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key (not part of the persisted record)
    #[serde(skip)]
    pub key: String,
    /// The cached payload
    pub data: Value,
    /// Creation timestamp (Unix milliseconds)
    #[serde(rename = "timestamp")]
    pub created_at: u64,
    /// Time to live in milliseconds
    pub ttl: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `data` - The payload to store
    /// * `ttl_ms` - Time to live in milliseconds
    pub fn new(key: impl Into<String>, data: Value, ttl_ms: u64) -> Self {
        Self {
            key: key.into(),
            data,
            created_at: current_timestamp_ms(),
            ttl: ttl_ms,
        }
    }

    // == Validity ==
    /// Returns true while `now - created_at < ttl`.
    ///
    /// Boundary condition: once exactly `ttl` milliseconds have elapsed the
    /// entry is stale, so a zero TTL is stale immediately.
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at) < self.ttl
    }

    /// Checks validity against the current clock.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(current_timestamp_ms())
    }

    // == Serialization ==
    /// Serializes the entry into its persisted record form.
    pub fn to_record(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses a persisted record, restoring the key it was stored under.
    pub fn from_record(key: &str, raw: &str) -> serde_json::Result<Self> {
        let mut entry: CacheEntry = serde_json::from_str(raw)?;
        entry.key = key.to_string();
        Ok(entry)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
