//! LRU Tracker Module
//!
//! Tracks access order for least-recently-used eviction.

use std::collections::VecDeque;

use crate::cache::CacheKey;

// == LRU Tracker ==
/// Access-order index over a cache's keys.
///
/// Front = most recently used, back = least recently used. Every operation
/// that refreshes an entry's `accessed_at` also touches the tracker, so the
/// back of the queue is always the entry with the minimal access time; ties
/// are broken by exact access order.
#[derive(Debug, Default)]
pub struct LruTracker {
    order: VecDeque<CacheKey>,
}

impl LruTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &CacheKey) {
        self.remove(key);
        self.order.push_front(key.clone());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &CacheKey) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key, None when empty.
    pub fn evict_oldest(&mut self) -> Option<CacheKey> {
        self.order.pop_back()
    }

    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&CacheKey> {
        self.order.back()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[cfg(test)]
    fn contains(&self, key: &CacheKey) -> bool {
        self.order.iter().any(|k| k == key)
    }
}
