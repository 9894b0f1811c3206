//! Wildcard key patterns for bulk invalidation.
//!
//! `*` matches any run of characters (including none). Every other character
//! matches itself literally, and a pattern must cover the whole key:
//! `user_*` matches `user_1` but not `power_user_1`.

use regex::Regex;

use crate::error::{CacheError, Result};

/// A compiled wildcard pattern.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    source: String,
    regex: Regex,
}

impl KeyPattern {
    /// Compiles `pattern`, escaping everything except `*`.
    pub fn new(pattern: &str) -> Result<Self> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = Regex::new(&format!("^{body}$"))
            .map_err(|e| CacheError::InvalidPattern(format!("{pattern}: {e}")))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Whether `key` matches the whole pattern.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// The pattern as written by the caller.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}
