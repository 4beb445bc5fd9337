//! Cache-First Strategy
//!
//! Serves from the cache when possible and fills it from the network on a
//! miss. On fetch failure this strategy runs its failure callbacks and then
//! re-raises the original error; unlike network-first it never synthesizes
//! a fallback response. Callers must be prepared for the error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{CacheOptions, CacheRegistry, SharedCache};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::models::{MatchOptions, WorkerRequest, WorkerResponse};
use crate::strategy::{run_callbacks, Strategy, StrategyCallback};

// == Cache First ==
pub struct CacheFirst {
    cache: SharedCache,
    fetcher: Arc<dyn Fetcher>,
    match_options: MatchOptions,
    on_failure: Vec<StrategyCallback>,
}

impl CacheFirst {
    pub fn new(cache: SharedCache, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            cache,
            fetcher,
            match_options: MatchOptions::default(),
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

    /// Registers a callback run when the fetch fails. All callbacks run
    /// concurrently and are awaited before the error is re-raised.
    pub fn on_failure(mut self, callback: StrategyCallback) -> Self {
        self.on_failure.push(callback);
        self
    }
}

#[async_trait]
impl Strategy for CacheFirst {
    async fn handle(&self, request: &WorkerRequest) -> Result<WorkerResponse> {
        if !request.is_http() {
            return Ok(WorkerResponse::not_http());
        }

        let key = request.cache_key();
        if let Some(hit) = self.cache.write().await.match_entry(&key, self.match_options) {
            debug!(key = %key, "cache-first hit");
            return Ok(hit);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                // Best-effort write; a failure is logged inside put and the
                // network response is returned regardless
                self.cache.write().await.put(&key, &response, None);
                Ok(response)
            }
            Err(err) => {
                run_callbacks(&self.on_failure).await;
                Err(err)
            }
        }
    }
}
