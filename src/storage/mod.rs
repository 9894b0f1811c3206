//! Storage Module
//!
//! Concrete [`KeyValueStore`](crate::cache::KeyValueStore) backends for the
//! persistent cache tier.

mod file;
mod memory;

pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;
