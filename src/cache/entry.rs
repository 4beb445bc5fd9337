//! Cache Entry Module
//!
//! Defines entry identity and the stored form of a cached response.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::envelope;
use crate::error::Result;
use crate::models::WorkerResponse;

// == Cache Key ==
/// Identity of a cache entry, derived from method and URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// HTTP method, uppercase
    pub method: String,
    /// Full request URL
    pub url: String,
}

impl CacheKey {
    /// Creates a key from a method and URL.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            url: url.into(),
        }
    }

    /// Creates a GET key, the common case for cacheable requests.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// The URL with its query string removed, fragment preserved.
    pub fn without_search(&self) -> String {
        let (rest, fragment) = match self.url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (self.url.as_str(), None),
        };
        let path = rest.split_once('?').map_or(rest, |(path, _)| path);
        match fragment {
            Some(fragment) => format!("{path}#{fragment}"),
            None => path.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

// == Cached Entry ==
/// A single cache entry.
///
/// `response` holds the sealed envelope form (§ the envelope module); the
/// timestamp fields mirror the envelope metadata so expiry and eviction
/// decisions never have to parse the body.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    /// The stored response in sealed envelope form
    pub response: WorkerResponse,
    /// When the entry was written (Unix milliseconds)
    pub stored_at: u64,
    /// When the entry was last read or written (Unix milliseconds)
    pub accessed_at: u64,
    /// Expiry timestamp (Unix milliseconds), None = never expires
    pub expires_at: Option<u64>,
}

impl CachedEntry {
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiry
    /// timestamp; entries without one never expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    /// Marks the entry accessed at `now` and returns the restored response.
    ///
    /// Rewrites the envelope so the stored metadata and mirror headers agree
    /// with the struct fields.
    pub fn refresh_access(&mut self, now: u64) -> Result<WorkerResponse> {
        let (mut envelope, _) = envelope::unseal(&self.response)?;
        envelope.metadata.accessed_at = now;
        self.response = envelope::reseal(&self.response, &envelope)?;
        self.accessed_at = now;
        let (_, restored) = envelope::unseal(&self.response)?;
        Ok(restored)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_uppercases_method() {
        let key = CacheKey::new("get", "http://localhost/a");
        assert_eq!(key.method, "GET");
        assert_eq!(key.to_string(), "GET http://localhost/a");
    }

    #[test]
    fn test_without_search_strips_query_only() {
        let key = CacheKey::get("http://localhost/a?x=1&y=2#frag");
        assert_eq!(key.without_search(), "http://localhost/a#frag");

        let bare = CacheKey::get("/docs");
        assert_eq!(bare.without_search(), "/docs");
    }

    #[test]
    fn test_entry_without_expiry_never_expires() {
        let entry = CachedEntry {
            response: WorkerResponse::ok("x", "text/plain"),
            stored_at: 0,
            accessed_at: 0,
            expires_at: None,
        };
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CachedEntry {
            response: WorkerResponse::ok("x", "text/plain"),
            stored_at: now,
            accessed_at: now,
            // Expires exactly at creation time
            expires_at: Some(now),
        };
        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }

    #[test]
    fn test_entry_in_the_future_is_live() {
        let now = current_timestamp_ms();
        let entry = CachedEntry {
            response: WorkerResponse::ok("x", "text/plain"),
            stored_at: now,
            accessed_at: now,
            expires_at: Some(now + 60_000),
        };
        assert!(!entry.is_expired());
    }
}
