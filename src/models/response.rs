//! Response model for the caching relay
//!
//! Defines the HTTP-like response shape the core produces and caches, plus
//! the two synthesized responses the strategies emit.

use std::borrow::Cow;

use serde_json::json;

/// An HTTP-like response: status, headers, body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, order-preserving
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl WorkerResponse {
    /// Creates a new response.
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Creates a 200 response with the given body and content type.
    pub fn ok(body: impl Into<Vec<u8>>, content_type: &str) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    /// The 403 response returned for non-HTTP-scheme requests.
    pub fn not_http() -> Self {
        Self {
            status: 403,
            headers: Vec::new(),
            body: b"Not a HTTP request".to_vec(),
        }
    }

    /// The synthesized 500 response the network-first strategy falls back to
    /// when both the network and the cache come up empty.
    pub fn network_error() -> Self {
        Self {
            status: 500,
            headers: vec![(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )],
            body: serde_json::to_vec(&json!({ "message": "Network Error" }))
                .unwrap_or_default(),
        }
    }

    /// True iff the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the first header with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replaces the named header, or appends it if absent.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            slot.1 = value;
        } else {
            self.headers.push((name.to_string(), value));
        }
    }

    /// Returns the `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// The body decoded as UTF-8 text.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
