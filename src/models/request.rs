//! Request model for the caching relay
//!
//! A request is the minimal HTTP-like shape the core consumes: a method, a
//! URL and optional headers/body for passthrough.

use serde::{Deserialize, Serialize};

use crate::cache::CacheKey;

/// An HTTP-like request flowing through the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRequest {
    /// HTTP method, uppercase
    pub method: String,
    /// Absolute or worker-relative URL
    pub url: String,
    /// Request headers
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Request body, forwarded untouched on passthrough
    #[serde(default)]
    pub body: Vec<u8>,
}

impl WorkerRequest {
    /// Creates a new request.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Returns the cache identity of this request.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.method, &self.url)
    }

    /// True iff the request URL uses an HTTP scheme.
    pub fn is_http(&self) -> bool {
        self.url.starts_with("http")
    }

    /// Returns the first header with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Options applied when looking an entry up in a cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Ignore the query string when comparing keys
    pub ignore_search: bool,
    /// Skip the stored `Vary` check
    pub ignore_vary: bool,
}
