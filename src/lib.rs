//! Tiered Cache - A two-tier TTL cache for application clients
//!
//! Keeps a process-local memory tier in front of a namespaced persistent
//! tier, with wildcard invalidation and fetch-or-populate helpers.

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;
pub mod tasks;

pub use cache::{CacheManager, CacheOptions, PreloadItem, SetOutcome};
pub use config::CacheConfig;
pub use tasks::spawn_sweep_task;
