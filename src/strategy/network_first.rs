//! Network-First Strategy
//!
//! Prefers fresh data, racing the fetch against a deadline, and falls back
//! to the cache when the network loses. Unlike cache-first this strategy
//! never propagates an error: a caller sees real data, a cached copy, or
//! the synthesized network-error response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{CacheOptions, CacheRegistry, SharedCache};
use crate::error::{Result, WorkerError};
use crate::fetch::Fetcher;
use crate::models::{MatchOptions, WorkerRequest, WorkerResponse};
use crate::strategy::{run_callbacks, Strategy, StrategyCallback};

/// Deadline applied when none is configured.
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(10);

// == Network First ==
pub struct NetworkFirst {
    cache: SharedCache,
    fetcher: Arc<dyn Fetcher>,
    match_options: MatchOptions,
    timeout: Duration,
    on_success: Vec<StrategyCallback>,
    on_failure: Vec<StrategyCallback>,
}

impl NetworkFirst {
    pub fn new(cache: SharedCache, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            cache,
            fetcher,
            match_options: MatchOptions::default(),
            timeout: DEFAULT_NETWORK_TIMEOUT,
            on_success: Vec::new(),
            on_failure: Vec::new(),
        }
    }

    /// Builds the strategy over a cache resolved by name.
    pub async fn from_registry(
        registry: &CacheRegistry,
        name: &str,
        options: Option<CacheOptions>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self::new(registry.open(name, options).await, fetcher)
    }

    pub fn with_match_options(mut self, options: MatchOptions) -> Self {
        self.match_options = options;
        self
    }

    /// Sets the network deadline. A fetch still pending when it fires is
    /// treated exactly like a fetch failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn on_success(mut self, callback: StrategyCallback) -> Self {
        self.on_success.push(callback);
        self
    }

    pub fn on_failure(mut self, callback: StrategyCallback) -> Self {
        self.on_failure.push(callback);
        self
    }
}

#[async_trait]
impl Strategy for NetworkFirst {
    async fn handle(&self, request: &WorkerRequest) -> Result<WorkerResponse> {
        if !request.is_http() {
            return Ok(WorkerResponse::not_http());
        }

        let key = request.cache_key();

        // The losing side of the race is dropped with the timeout future, so
        // no timer outlives the resolution
        let outcome = tokio::time::timeout(self.timeout, self.fetcher.fetch(request)).await;

        let failure = match outcome {
            Ok(Ok(response)) => {
                run_callbacks(&self.on_success).await;
                self.cache.write().await.put(&key, &response, None);
                return Ok(response);
            }
            Ok(Err(err)) => err,
            Err(_) => WorkerError::Timeout(self.timeout.as_secs()),
        };

        debug!(key = %key, error = %failure, "network lost, falling back to cache");
        run_callbacks(&self.on_failure).await;

        if let Some(hit) = self.cache.write().await.match_entry(&key, self.match_options) {
            return Ok(hit);
        }
        Ok(WorkerResponse::network_error())
    }
}
