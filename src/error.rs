//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache storage and pattern handling.
///
/// The manager converts these into soft failures (`None`, `false`, a zero
/// count) before they reach callers; they surface directly only from the
/// storage backends and the pattern compiler.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The persistent backend failed to read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// A payload or persisted record could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A wildcard pattern could not be compiled
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = CacheError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "Storage error: disk full");
    }

    #[test]
    fn test_serialization_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CacheError = json_err.into();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
