//! Cache Module
//!
//! Named, bounded response caches with TTL expiration and LRU eviction.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

mod entry;
mod envelope;
mod lru;
mod registry;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheKey, CachedEntry};
pub use envelope::{
    Envelope, EnvelopeMetadata, ACCESS_TIME_HEADER, ORIGINAL_CONTENT_TYPE_HEADER, TTL_HEADER,
};
pub use lru::LruTracker;
pub use registry::CacheRegistry;
pub use stats::CacheStats;
pub use store::{add, CacheStore, SharedCache};

// == Public Constants ==
/// Default per-cache entry cap
pub const DEFAULT_MAX_ITEMS: usize = 100;

// == TTL Policy ==
/// Time-to-live policy for entries of a cache.
///
/// "Never expires" is an explicit variant, not a sentinel value; the
/// JSON-unsafe `"Infinity"` string exists only inside the wire envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Entries never expire
    #[default]
    Forever,
    /// Entries expire this long after they are stored
    After(Duration),
    /// Caching is off; every put is dropped
    Disabled,
}

impl Ttl {
    /// Creates a finite TTL from whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Ttl::After(Duration::from_secs(secs))
    }

    /// True iff puts under this policy must be dropped.
    pub fn is_disabled(&self) -> bool {
        match self {
            Ttl::Disabled => true,
            Ttl::After(d) => d.is_zero(),
            Ttl::Forever => false,
        }
    }

    /// Absolute expiry timestamp for an entry stored at `now_ms`.
    pub fn expires_at(&self, now_ms: u64) -> Option<u64> {
        match self {
            Ttl::After(d) => Some(now_ms + d.as_millis() as u64),
            Ttl::Forever | Ttl::Disabled => None,
        }
    }
}

impl fmt::Display for Ttl {
    /// Wire form: `Infinity`, `-1`, or milliseconds.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Forever => write!(f, "Infinity"),
            Ttl::Disabled => write!(f, "-1"),
            Ttl::After(d) => write!(f, "{}", d.as_millis()),
        }
    }
}

impl FromStr for Ttl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Infinity" => Ok(Ttl::Forever),
            _ => {
                let ms: i64 = s.parse().map_err(|_| format!("invalid ttl: {s}"))?;
                if ms <= 0 {
                    Ok(Ttl::Disabled)
                } else {
                    Ok(Ttl::After(Duration::from_millis(ms as u64)))
                }
            }
        }
    }
}

// == Strategy Hint ==
/// Advisory strategy label stored with a cache. Does not enforce policy,
/// with one exception: a `NetworkOnly` cache is created with caching
/// disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyHint {
    CacheFirst,
    #[default]
    NetworkFirst,
    CacheOnly,
    NetworkOnly,
    StaleWhileRevalidate,
}

// == Cache Options ==
/// Configuration fixed at cache creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    pub ttl: Ttl,
    pub max_items: usize,
    pub strategy: StrategyHint,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: Ttl::Forever,
            max_items: DEFAULT_MAX_ITEMS,
            strategy: StrategyHint::NetworkFirst,
        }
    }
}

impl CacheOptions {
    /// Options with a finite TTL in seconds and defaults elsewhere.
    pub fn with_ttl_secs(secs: u64) -> Self {
        Self {
            ttl: Ttl::from_secs(secs),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_wire_roundtrip() {
        for ttl in [Ttl::Forever, Ttl::Disabled, Ttl::from_secs(60)] {
            let wire = ttl.to_string();
            assert_eq!(wire.parse::<Ttl>().unwrap(), ttl);
        }
    }

    #[test]
    fn test_ttl_disabled() {
        assert!(Ttl::Disabled.is_disabled());
        assert!(Ttl::After(Duration::ZERO).is_disabled());
        assert!(!Ttl::Forever.is_disabled());
        assert!(!Ttl::from_secs(1).is_disabled());
    }

    #[test]
    fn test_ttl_expires_at() {
        assert_eq!(Ttl::Forever.expires_at(1_000), None);
        assert_eq!(Ttl::from_secs(2).expires_at(1_000), Some(3_000));
    }

    #[test]
    fn test_strategy_hint_wire_names() {
        let json = serde_json::to_string(&StrategyHint::NetworkFirst).unwrap();
        assert_eq!(json, "\"network-first\"");
        let parsed: StrategyHint = serde_json::from_str("\"cache-only\"").unwrap();
        assert_eq!(parsed, StrategyHint::CacheOnly);
    }
}
