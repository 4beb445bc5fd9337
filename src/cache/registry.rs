//! Cache Registry Module
//!
//! Name-keyed factory over cache stores with create-or-get semantics.
//! Process-wide state, constructed once at worker start and injected into
//! strategies and the orchestrator.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheKey, CacheOptions, CacheStats, CacheStore, SharedCache};

// == Cache Registry ==
/// At most one store exists per name for the process lifetime; registry
/// entries are removed only by explicit `delete`/`clear`.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    instances: RwLock<HashMap<String, SharedCache>>,
}

impl CacheRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Open ==
    /// Returns the store with the given name, creating it if necessary.
    ///
    /// Configuration only applies at creation; opening an existing store
    /// ignores the new options.
    pub async fn open(&self, name: &str, options: Option<CacheOptions>) -> SharedCache {
        let mut instances = self.instances.write().await;
        if let Some(existing) = instances.get(name) {
            if options.is_some() {
                debug!(cache = name, "cache already open, ignoring new configuration");
            }
            return existing.clone();
        }

        let store = match options {
            Some(options) => CacheStore::with_options(name, options),
            None => CacheStore::new(name),
        };
        let shared = store.into_shared();
        instances.insert(name.to_string(), shared.clone());
        info!(cache = name, "created cache");
        shared
    }

    // == Has ==
    /// Checks whether a store with the given name exists.
    pub async fn has(&self, name: &str) -> bool {
        self.instances.read().await.contains_key(name)
    }

    // == Get ==
    /// Returns the store with the given name without creating one.
    pub async fn get(&self, name: &str) -> Option<SharedCache> {
        self.instances.read().await.get(name).cloned()
    }

    // == Delete ==
    /// Removes the registry entry and clears its backing storage.
    pub async fn delete(&self, name: &str) {
        let removed = self.instances.write().await.remove(name);
        if let Some(cache) = removed {
            cache.write().await.clear();
            info!(cache = name, "deleted cache");
        }
    }

    // == Clear ==
    /// Removes every registry entry and clears all backing storage.
    pub async fn clear(&self) {
        let drained: Vec<SharedCache> = {
            let mut instances = self.instances.write().await;
            instances.drain().map(|(_, cache)| cache).collect()
        };
        for cache in drained {
            cache.write().await.clear();
        }
    }

    // == Match Any ==
    /// Raw presence probe across all stores: exact key, no expiry
    /// processing, no access-time touch.
    pub async fn match_any(&self, key: &CacheKey) -> bool {
        let instances = self.instances.read().await;
        for cache in instances.values() {
            if cache.read().await.contains_key(key) {
                return true;
            }
        }
        false
    }

    // == Cleanup Expired ==
    /// Sweeps expired entries out of every store. Returns the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        let caches: Vec<SharedCache> =
            self.instances.read().await.values().cloned().collect();
        let mut removed = 0;
        for cache in caches {
            removed += cache.write().await.cleanup_expired();
        }
        removed
    }

    // == Stats ==
    /// Per-cache statistics, sorted by cache name.
    pub async fn stats(&self) -> Vec<(String, CacheStats)> {
        let instances = self.instances.read().await;
        let mut stats = Vec::with_capacity(instances.len());
        for (name, cache) in instances.iter() {
            stats.push((name.clone(), cache.read().await.stats()));
        }
        drop(instances);
        stats.sort_by(|a, b| a.0.cmp(&b.0));
        stats
    }

    /// Number of registered caches.
    pub async fn len(&self) -> usize {
        self.instances.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.instances.read().await.is_empty()
    }
}
