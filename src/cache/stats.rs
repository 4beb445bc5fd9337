//! Cache Statistics Module
//!
//! Per-cache counters for hits, misses and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Performance counters kept by each cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a live entry
    pub hits: u64,
    /// Lookups that found nothing, or only an expired entry
    pub misses: u64,
    /// Entries removed by the LRU policy
    pub evictions: u64,
    /// Current number of physically stored entries
    pub total_entries: usize,
}

impl CacheStats {
    /// Creates stats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// hits / (hits + misses), 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
