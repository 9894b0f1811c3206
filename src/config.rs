//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::ttl;

/// Default namespace prefix for persisted cache keys.
pub const DEFAULT_KEY_PREFIX: &str = "@cache_";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the file-backed persistent store
    pub storage_dir: PathBuf,
    /// Namespace prefix applied to every persisted cache key
    pub key_prefix: String,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// Background sweep interval in seconds (0 disables the sweep)
    pub sweep_interval: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_STORAGE_DIR` - Persistent store directory (default: `.tiered_cache`)
    /// - `CACHE_KEY_PREFIX` - Persisted key namespace (default: `@cache_`)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            storage_dir: env::var("CACHE_STORAGE_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            key_prefix: env::var("CACHE_KEY_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.key_prefix),
            default_ttl_ms: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl_ms),
            sweep_interval: env::var("CACHE_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".tiered_cache"),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            default_ttl_ms: ttl::MEDIUM,
            sweep_interval: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.storage_dir, PathBuf::from(".tiered_cache"));
        assert_eq!(config.key_prefix, "@cache_");
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.sweep_interval, 60);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_STORAGE_DIR");
        env::remove_var("CACHE_KEY_PREFIX");
        env::remove_var("CACHE_DEFAULT_TTL_MS");
        env::remove_var("CACHE_SWEEP_INTERVAL_SECS");

        let config = CacheConfig::from_env();
        assert_eq!(config.key_prefix, "@cache_");
        assert_eq!(config.default_ttl_ms, ttl::MEDIUM);
        assert_eq!(config.sweep_interval, 60);
    }
}
