//! Request Classification
//!
//! Decides which strategy handles an inbound request: `asset` for GET
//! requests under configured path prefixes, `loader` for GET requests
//! carrying the reserved data marker, otherwise unclassified. Unclassified
//! requests never touch the cache.

use url::form_urlencoded;

use crate::models::WorkerRequest;

/// Reserved query parameter naming the route whose loader data a request
/// targets.
pub const LOADER_PARAM: &str = "_data";

/// Classification of a cacheable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Asset,
    Loader,
}

/// Classifies requests against a configurable set of asset path prefixes.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    asset_prefixes: Vec<String>,
}

impl RequestClassifier {
    pub fn new(asset_prefixes: Vec<String>) -> Self {
        Self { asset_prefixes }
    }

    /// Classifies a request, or returns None for passthrough.
    pub fn classify(&self, request: &WorkerRequest) -> Option<RequestKind> {
        if !request.method.eq_ignore_ascii_case("GET") {
            return None;
        }
        if self
            .asset_prefixes
            .iter()
            .any(|prefix| request.url.contains(prefix.as_str()))
        {
            return Some(RequestKind::Asset);
        }
        if has_loader_marker(&request.url) {
            return Some(RequestKind::Loader);
        }
        None
    }
}

impl Default for RequestClassifier {
    fn default() -> Self {
        Self::new(vec!["/build/".to_string(), "/icons".to_string()])
    }
}

/// True iff the URL carries a non-empty loader marker.
fn has_loader_marker(url: &str) -> bool {
    let Some(query) = query_of(url) else {
        return false;
    };
    form_urlencoded::parse(query.as_bytes())
        .any(|(name, value)| name == LOADER_PARAM && !value.is_empty())
}

/// The query component of a URL, without the leading `?`.
fn query_of(url: &str) -> Option<&str> {
    let rest = url.split_once('#').map_or(url, |(rest, _)| rest);
    rest.split_once('?').map(|(_, query)| query)
}
