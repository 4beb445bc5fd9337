//! Caching Strategies
//!
//! Pull-through read/write policies composed over a cache store and the
//! fetch primitive. The two strategies fail differently on purpose:
//! cache-first re-raises fetch errors to its caller, network-first always
//! produces a response.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};

use crate::error::Result;
use crate::models::{WorkerRequest, WorkerResponse};

mod cache_first;
mod network_first;

pub use cache_first::CacheFirst;
pub use network_first::{NetworkFirst, DEFAULT_NETWORK_TIMEOUT};

/// Callback invoked when a strategy's fetch settles.
pub type StrategyCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Runs all callbacks concurrently and waits for every one of them.
pub(crate) async fn run_callbacks(callbacks: &[StrategyCallback]) {
    join_all(callbacks.iter().map(|callback| callback())).await;
}

// == Strategy Trait ==
/// A request-handling policy over a cache and the network.
#[async_trait]
pub trait Strategy: Send + Sync {
    async fn handle(&self, request: &WorkerRequest) -> Result<WorkerResponse>;
}

// == Test Support ==
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::{Result, WorkerError};
    use crate::fetch::Fetcher;
    use crate::models::{WorkerRequest, WorkerResponse};

    /// Scriptable fetcher: stubbed responses per URL, a kill switch and a
    /// hang switch, plus a call log.
    #[derive(Default)]
    pub(crate) struct MockFetcher {
        responses: Mutex<HashMap<String, WorkerResponse>>,
        calls: Mutex<Vec<String>>,
        offline: AtomicBool,
        hanging: AtomicBool,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn stub(&self, url: &str, response: WorkerResponse) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), response);
        }

        pub fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }

        pub fn hang(&self) {
            self.hanging.store(true, Ordering::SeqCst);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, request: &WorkerRequest) -> Result<WorkerResponse> {
            self.calls.lock().unwrap().push(request.url.clone());
            if self.hanging.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.offline.load(Ordering::SeqCst) {
                return Err(WorkerError::Network("connection refused".to_string()));
            }
            let stubbed = self.responses.lock().unwrap().get(&request.url).cloned();
            Ok(stubbed
                .unwrap_or_else(|| WorkerResponse::ok(request.url.clone(), "text/plain")))
        }
    }
}
