//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Stale sweep: Removes stale entries from both cache tiers at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
