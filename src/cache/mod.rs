//! Cache Module
//!
//! Two-tier TTL caching: a process-local memory tier in front of a
//! namespaced persistent tier.

mod entry;
mod manager;
mod memory;
mod pattern;
mod persistent;
mod stats;
pub mod ttl;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use manager::{CacheManager, CacheOptions, PreloadItem, PreloadSummary, SetOutcome};
pub use memory::MemoryStore;
pub use pattern::KeyPattern;
pub use persistent::{KeyValueStore, PersistentStore};
pub use stats::CacheStats;
