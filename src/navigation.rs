//! Navigation Prefetch Orchestrator
//!
//! Consumes navigation messages from the client-side router and warms the
//! document and data caches ahead of need. All fetch+cache operations for
//! one event run concurrently, deduplicated by URL, and the event is held
//! open until every one of them has settled.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::cache::{CacheKey, CacheRegistry, SharedCache};
use crate::classify::LOADER_PARAM;
use crate::fetch::Fetcher;
use crate::models::{NavigationLocation, NavigationMessage, WorkerRequest, NAVIGATION_MESSAGE_TYPE};

// == Navigation Handler ==
pub struct NavigationHandler {
    registry: Arc<CacheRegistry>,
    document_cache: String,
    data_cache: String,
    fetcher: Arc<dyn Fetcher>,
}

impl NavigationHandler {
    pub fn new(
        registry: Arc<CacheRegistry>,
        document_cache: impl Into<String>,
        data_cache: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            registry,
            document_cache: document_cache.into(),
            data_cache: data_cache.into(),
            fetcher,
        }
    }

    /// Routes a raw message by its `type` field; anything that is not a
    /// navigation is ignored.
    pub async fn handle_message(&self, message: &serde_json::Value) {
        if message.get("type").and_then(|t| t.as_str()) != Some(NAVIGATION_MESSAGE_TYPE) {
            return;
        }
        match serde_json::from_value::<NavigationMessage>(message.clone()) {
            Ok(navigation) => self.handle(&navigation).await,
            Err(err) => warn!(error = %err, "malformed navigation message"),
        }
    }

    /// Handles one navigation event.
    ///
    /// The document is refreshed when it is cached nowhere or the event is a
    /// mount; on a mount, loader data is prefetched for every matched route
    /// that has one. A route id appearing twice schedules at most one fetch.
    /// Individual failures are logged and abort nothing else.
    pub async fn handle(&self, message: &NavigationMessage) {
        if message.kind != NAVIGATION_MESSAGE_TYPE {
            return;
        }

        let document_cache = self.registry.open(&self.document_cache, None).await;
        let data_cache = self.registry.open(&self.data_cache, None).await;

        let document_url = message.location.document_url();
        let mut scheduled: HashSet<String> = HashSet::new();
        let mut operations = Vec::new();

        let document_cached = self
            .registry
            .match_any(&CacheKey::get(&document_url))
            .await;
        if !document_cached || message.is_mount {
            scheduled.insert(document_url.clone());
            operations.push(self.prefetch(document_cache.clone(), document_url));
        }

        if message.is_mount {
            for route_match in &message.matches {
                let has_loader = message
                    .manifest
                    .routes
                    .get(&route_match.id)
                    .is_some_and(|route| route.has_loader);
                if !has_loader {
                    continue;
                }

                let url = loader_url(&message.location, &route_match.id);
                if scheduled.insert(url.clone()) {
                    debug!(url = %url, "caching data for navigation");
                    operations.push(self.prefetch(data_cache.clone(), url));
                }
            }
        }

        // The event stays alive until every operation has settled
        join_all(operations).await;
    }

    async fn prefetch(&self, cache: SharedCache, url: String) {
        match self.fetcher.fetch(&WorkerRequest::get(&url)).await {
            Ok(response) => {
                // Write failures are logged inside put and never abort
                // sibling operations
                cache.write().await.put(&CacheKey::get(&url), &response, None);
            }
            Err(err) => warn!(url = %url, error = %err, "navigation prefetch failed"),
        }
    }
}

/// Builds a loader URL for a route: the current query string with the data
/// marker set to the route id.
fn loader_url(location: &NavigationLocation, route_id: &str) -> String {
    let raw = location
        .search
        .strip_prefix('?')
        .unwrap_or(&location.search);
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(raw.as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    match pairs.iter_mut().find(|(name, _)| name == LOADER_PARAM) {
        Some(pair) => pair.1 = route_id.to_string(),
        None => pairs.push((LOADER_PARAM.to_string(), route_id.to_string())),
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(pairs.iter().map(|(name, value)| (name.as_str(), value.as_str())));
    let search = serializer.finish();
    let search = if search.is_empty() {
        String::new()
    } else {
        format!("?{search}")
    };

    format!("{}{}{}", location.pathname, search, location.hash)
}
