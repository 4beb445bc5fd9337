//! Cache Store Module
//!
//! A named, bounded response cache combining HashMap storage with LRU
//! tracking and lazy TTL expiration.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::cache::{
    current_timestamp_ms, envelope, CacheKey, CacheOptions, CacheStats, CachedEntry,
    EnvelopeMetadata, LruTracker, StrategyHint, Ttl, DEFAULT_MAX_ITEMS,
};
use crate::error::{Result, WorkerError};
use crate::fetch::Fetcher;
use crate::models::{MatchOptions, WorkerRequest, WorkerResponse};

/// How stores are shared between strategies, the orchestrator and tasks.
///
/// The source design tolerates un-locked concurrent mutation with weak
/// consistency; safe Rust cannot, so mutations are serialized behind this
/// lock (see DESIGN.md).
pub type SharedCache = Arc<RwLock<CacheStore>>;

// == Cache Store ==
/// Named response cache with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    /// Cache name, unique within a registry
    name: String,
    /// Key-value storage, entries kept in sealed envelope form
    entries: HashMap<CacheKey, CachedEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// TTL applied to puts without an override
    ttl: Ttl,
    /// Maximum number of entries allowed
    max_items: usize,
    /// Advisory strategy label
    strategy: StrategyHint,
    /// False until configuration is fixed; an unconfigured store adopts the
    /// settings stored in its first existing entry on first use
    configured: bool,
}

impl CacheStore {
    // == Constructors ==
    /// Creates an unconfigured store with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            ttl: Ttl::Forever,
            max_items: DEFAULT_MAX_ITEMS,
            strategy: StrategyHint::NetworkFirst,
            configured: false,
        }
    }

    /// Creates a store with configuration fixed at creation.
    ///
    /// A `NetworkOnly` strategy disables caching outright.
    pub fn with_options(name: impl Into<String>, options: CacheOptions) -> Self {
        let ttl = if options.strategy == StrategyHint::NetworkOnly {
            Ttl::Disabled
        } else {
            options.ttl
        };
        Self {
            ttl,
            max_items: options.max_items,
            strategy: options.strategy,
            configured: true,
            ..Self::new(name)
        }
    }

    /// Recreates an unconfigured store over entries that survived in backing
    /// storage. Settings are inferred from the first entry on first use.
    pub fn with_entries(
        name: impl Into<String>,
        entries: HashMap<CacheKey, CachedEntry>,
    ) -> Self {
        let mut store = Self::new(name);
        let mut keys: Vec<CacheKey> = entries.keys().cloned().collect();
        keys.sort_by_key(|k| entries[k].accessed_at);
        for key in keys {
            store.lru.touch(&key);
        }
        store.stats.set_total_entries(entries.len());
        store.entries = entries;
        store
    }

    /// Wraps the store for shared use.
    pub fn into_shared(self) -> SharedCache {
        Arc::new(RwLock::new(self))
    }

    // == Accessors ==
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn strategy(&self) -> StrategyHint {
        self.strategy
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    // == Match ==
    /// Looks an entry up by key.
    ///
    /// An expired hit deletes the entry and reports absence; a live hit
    /// refreshes `accessed_at` and returns the restored response. Absence is
    /// not an error.
    pub fn match_entry(
        &mut self,
        key: &CacheKey,
        options: MatchOptions,
    ) -> Option<WorkerResponse> {
        let Some(stored_key) = self.resolve_key(key, options) else {
            self.stats.record_miss();
            return None;
        };

        self.ensure_configured();

        if self
            .entries
            .get(&stored_key)
            .is_some_and(|entry| entry.is_expired())
        {
            self.remove_entry(&stored_key);
            self.stats.record_miss();
            return None;
        }

        let now = current_timestamp_ms();
        let entry = self.entries.get_mut(&stored_key)?;
        match entry.refresh_access(now) {
            Ok(restored) => {
                self.lru.touch(&stored_key);
                self.stats.record_hit();
                Some(restored)
            }
            Err(err) => {
                error!(cache = %self.name, key = %stored_key, error = %err,
                    "dropping unreadable cache entry");
                self.remove_entry(&stored_key);
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores a response under a key.
    ///
    /// A disabled TTL (store-level or override) makes the call a no-op. An
    /// insert at capacity first evicts the least recently used entry. Write
    /// failures are logged and never surfaced to the caller.
    pub fn put(&mut self, key: &CacheKey, response: &WorkerResponse, ttl_override: Option<Ttl>) {
        if ttl_override.unwrap_or(self.ttl).is_disabled() {
            debug!(cache = %self.name, key = %key, "caching disabled, dropping put");
            return;
        }

        self.ensure_configured();

        // Inference may have adopted a disabled TTL from a stored entry
        let effective_ttl = ttl_override.unwrap_or(self.ttl);
        if effective_ttl.is_disabled() {
            debug!(cache = %self.name, key = %key, "caching disabled, dropping put");
            return;
        }

        let now = current_timestamp_ms();
        let expires_at = effective_ttl.expires_at(now);

        // Evict only when inserting a new key; an overwrite cannot exceed
        // the cap.
        let is_overwrite = self.entries.contains_key(key);
        if !is_overwrite && self.entries.len() >= self.max_items {
            self.evict_lru();
        }

        let metadata = EnvelopeMetadata {
            accessed_at: now,
            expires_at,
            cache_ttl: self.ttl,
            cache_max_items: self.max_items,
            cache_strategy: self.strategy,
        };

        match envelope::seal(response, &metadata) {
            Ok(sealed) => {
                self.entries.insert(
                    key.clone(),
                    CachedEntry {
                        response: sealed,
                        stored_at: now,
                        accessed_at: now,
                        expires_at,
                    },
                );
                self.lru.touch(key);
                self.stats.set_total_entries(self.entries.len());
            }
            Err(err) => {
                error!(cache = %self.name, key = %key, error = %err,
                    "failed to write entry to cache");
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns true iff an entry was removed.
    pub fn delete(&mut self, key: &CacheKey, options: MatchOptions) -> bool {
        let Some(stored_key) = self.resolve_key(key, options) else {
            return false;
        };
        self.remove_entry(&stored_key)
    }

    // == Length ==
    /// Current number of physically stored entries, expired stragglers
    /// included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Keys ==
    /// Snapshot of the stored keys at call time, not a live view.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.keys().cloned().collect()
    }

    /// Raw physical presence probe; no expiry processing, no access touch.
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.remove_entry(&key);
        }
        count
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru = LruTracker::new();
        self.stats.set_total_entries(0);
    }

    // == Internals ==
    /// Resolves a probe key to a stored key under the given options.
    fn resolve_key(&self, key: &CacheKey, options: MatchOptions) -> Option<CacheKey> {
        let stored_key = if self.entries.contains_key(key) {
            Some(key.clone())
        } else if options.ignore_search {
            let target = key.without_search();
            self.entries
                .keys()
                .find(|k| k.method == key.method && k.without_search() == target)
                .cloned()
        } else {
            None
        }?;

        if !options.ignore_vary {
            let varies_on_everything = self
                .entries
                .get(&stored_key)
                .and_then(|entry| entry.response.header("Vary"))
                .is_some_and(|vary| vary.trim() == "*");
            if varies_on_everything {
                return None;
            }
        }

        Some(stored_key)
    }

    /// Adopts configuration from the first existing entry when the store was
    /// opened without options; an empty store keeps the defaults.
    fn ensure_configured(&mut self) {
        if self.configured {
            return;
        }
        self.configured = true;

        let Some(entry) = self.entries.values().next() else {
            return;
        };
        match envelope::unseal(&entry.response) {
            Ok((envelope, _)) => {
                self.ttl = envelope.metadata.cache_ttl;
                self.max_items = envelope.metadata.cache_max_items;
                self.strategy = envelope.metadata.cache_strategy;
            }
            Err(err) => {
                warn!(cache = %self.name, error = %err,
                    "could not infer configuration from stored entry, keeping defaults");
            }
        }
    }

    fn evict_lru(&mut self) {
        match self.lru.evict_oldest() {
            Some(evicted) => {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                self.stats.set_total_entries(self.entries.len());
                debug!(cache = %self.name, key = %evicted, "evicted least recently used entry");
            }
            None => {
                warn!(cache = %self.name, "cache at capacity but tracker is empty");
            }
        }
    }

    fn remove_entry(&mut self, key: &CacheKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }
}

// == Add ==
/// Fetches a request from the network and caches the result, only if the
/// fetch succeeded. A non-2xx status or transport error is a failure and
/// nothing is cached.
pub async fn add(
    cache: &SharedCache,
    request: &WorkerRequest,
    fetcher: &dyn Fetcher,
) -> Result<()> {
    let response = fetcher.fetch(request).await?;
    if !response.is_success() {
        return Err(WorkerError::Network(format!(
            "Failed to fetch {} (status {})",
            request.url, response.status
        )));
    }
    cache.write().await.put(&request.cache_key(), &response, None);
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    use crate::cache::ACCESS_TIME_HEADER;

    fn store() -> CacheStore {
        CacheStore::with_options("test-cache", CacheOptions::default())
    }

    fn html(body: &str) -> WorkerResponse {
        WorkerResponse::ok(body, "text/html")
    }

    #[test]
    fn test_store_new() {
        let store = store();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.name(), "test-cache");
    }

    #[test]
    fn test_put_then_match_returns_identical_body() {
        let mut store = store();
        let before = current_timestamp_ms();

        store.put(&CacheKey::get("/a"), &html("<p>hello</p>"), None);
        let hit = store
            .match_entry(&CacheKey::get("/a"), MatchOptions::default())
            .unwrap();

        assert_eq!(hit.body, b"<p>hello</p>");
        assert_eq!(hit.content_type(), Some("text/html"));

        let accessed_at: u64 = hit.header(ACCESS_TIME_HEADER).unwrap().parse().unwrap();
        assert!(accessed_at >= before);
    }

    #[test]
    fn test_match_nonexistent() {
        let mut store = store();
        let miss = store.match_entry(&CacheKey::get("/missing"), MatchOptions::default());
        assert!(miss.is_none());
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_expired_entry_is_absent_and_removed() {
        let mut store = store();
        store.put(
            &CacheKey::get("/a"),
            &html("x"),
            Some(Ttl::After(Duration::from_millis(20))),
        );
        assert_eq!(store.len(), 1);

        sleep(Duration::from_millis(40));

        let miss = store.match_entry(&CacheKey::get("/a"), MatchOptions::default());
        assert!(miss.is_none());
        assert_eq!(store.len(), 0, "expired entry should be deleted on match");
    }

    #[test]
    fn test_delete_twice_returns_false() {
        let mut store = store();
        store.put(&CacheKey::get("/a"), &html("x"), None);

        assert!(store.delete(&CacheKey::get("/a"), MatchOptions::default()));
        assert!(!store.delete(&CacheKey::get("/a"), MatchOptions::default()));
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let mut store = store();
        store.put(&CacheKey::get("/a"), &html("one"), None);
        store.put(&CacheKey::get("/a"), &html("two"), None);

        let hit = store
            .match_entry(&CacheKey::get("/a"), MatchOptions::default())
            .unwrap();
        assert_eq!(hit.body, b"two");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_exactly_one_lru_entry() {
        let mut store = CacheStore::with_options(
            "small",
            CacheOptions {
                max_items: 3,
                ..CacheOptions::default()
            },
        );

        store.put(&CacheKey::get("/a"), &html("a"), None);
        sleep(Duration::from_millis(2));
        store.put(&CacheKey::get("/b"), &html("b"), None);
        sleep(Duration::from_millis(2));
        store.put(&CacheKey::get("/c"), &html("c"), None);
        sleep(Duration::from_millis(2));

        // /a has the minimal access time and goes first
        store.put(&CacheKey::get("/d"), &html("d"), None);

        assert_eq!(store.len(), 3);
        assert!(store
            .match_entry(&CacheKey::get("/a"), MatchOptions::default())
            .is_none());
        assert!(store
            .match_entry(&CacheKey::get("/b"), MatchOptions::default())
            .is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_match_protects_entry_from_eviction() {
        let mut store = CacheStore::with_options(
            "small",
            CacheOptions {
                max_items: 3,
                ..CacheOptions::default()
            },
        );

        store.put(&CacheKey::get("/a"), &html("a"), None);
        sleep(Duration::from_millis(2));
        store.put(&CacheKey::get("/b"), &html("b"), None);
        sleep(Duration::from_millis(2));
        store.put(&CacheKey::get("/c"), &html("c"), None);
        sleep(Duration::from_millis(2));

        // Touch /a so /b becomes the eviction candidate
        store.match_entry(&CacheKey::get("/a"), MatchOptions::default());
        store.put(&CacheKey::get("/d"), &html("d"), None);

        assert!(store
            .match_entry(&CacheKey::get("/a"), MatchOptions::default())
            .is_some());
        assert!(store
            .match_entry(&CacheKey::get("/b"), MatchOptions::default())
            .is_none());
    }

    #[test]
    fn test_disabled_ttl_makes_put_a_noop() {
        let mut store = CacheStore::with_options(
            "network-only",
            CacheOptions {
                strategy: StrategyHint::NetworkOnly,
                ..CacheOptions::default()
            },
        );
        assert_eq!(store.ttl(), Ttl::Disabled);

        store.put(&CacheKey::get("/a"), &html("x"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_disabled_override_makes_put_a_noop() {
        let mut store = store();
        store.put(&CacheKey::get("/a"), &html("x"), Some(Ttl::Disabled));
        assert!(store.is_empty());
    }

    #[test]
    fn test_ignore_search_matches_across_queries() {
        let mut store = store();
        store.put(&CacheKey::get("/a?v=1"), &html("x"), None);

        let strict = store.match_entry(&CacheKey::get("/a?v=2"), MatchOptions::default());
        assert!(strict.is_none());

        let relaxed = store.match_entry(
            &CacheKey::get("/a?v=2"),
            MatchOptions {
                ignore_search: true,
                ..MatchOptions::default()
            },
        );
        assert!(relaxed.is_some());
    }

    #[test]
    fn test_vary_star_blocks_match_unless_ignored() {
        let mut store = store();
        let mut response = html("x");
        response.set_header("Vary", "*");
        store.put(&CacheKey::get("/a"), &response, None);

        assert!(store
            .match_entry(&CacheKey::get("/a"), MatchOptions::default())
            .is_none());
        assert!(store
            .match_entry(
                &CacheKey::get("/a"),
                MatchOptions {
                    ignore_vary: true,
                    ..MatchOptions::default()
                },
            )
            .is_some());
    }

    #[test]
    fn test_keys_is_a_snapshot() {
        let mut store = store();
        store.put(&CacheKey::get("/a"), &html("a"), None);
        store.put(&CacheKey::get("/b"), &html("b"), None);

        let keys = store.keys();
        store.put(&CacheKey::get("/c"), &html("c"), None);

        assert_eq!(keys.len(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_cleanup_expired() {
        let mut store = store();
        store.put(
            &CacheKey::get("/short"),
            &html("x"),
            Some(Ttl::After(Duration::from_millis(20))),
        );
        store.put(&CacheKey::get("/long"), &html("y"), None);

        sleep(Duration::from_millis(40));

        let removed = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store
            .match_entry(&CacheKey::get("/long"), MatchOptions::default())
            .is_some());
    }

    #[test]
    fn test_unconfigured_store_adopts_settings_from_first_entry() {
        // Populate a configured store, then rebuild an unconfigured one over
        // its surviving entries (the restart path)
        let mut original = CacheStore::with_options(
            "survivor",
            CacheOptions {
                ttl: Ttl::from_secs(60),
                max_items: 7,
                strategy: StrategyHint::CacheFirst,
            },
        );
        original.put(&CacheKey::get("/a"), &html("x"), None);

        // Entries survive in sealed form
        let entries = original.entries.clone();

        let mut revived = CacheStore::with_entries("survivor", entries);
        revived.put(&CacheKey::get("/b"), &html("y"), None);

        assert_eq!(revived.ttl(), Ttl::from_secs(60));
        assert_eq!(revived.max_items(), 7);
        assert_eq!(revived.strategy(), StrategyHint::CacheFirst);
    }

    #[test]
    fn test_unconfigured_empty_store_keeps_defaults() {
        let mut store = CacheStore::new("fresh");
        store.put(&CacheKey::get("/a"), &html("x"), None);

        assert_eq!(store.ttl(), Ttl::Forever);
        assert_eq!(store.max_items(), DEFAULT_MAX_ITEMS);
        assert_eq!(store.strategy(), StrategyHint::NetworkFirst);
    }

    #[tokio::test]
    async fn test_add_caches_successful_fetch() {
        use crate::strategy::testing::MockFetcher;

        let cache = store().into_shared();
        let fetcher = MockFetcher::new();
        fetcher.stub("http://localhost/a", html("fetched"));

        add(&cache, &WorkerRequest::get("http://localhost/a"), &fetcher)
            .await
            .unwrap();

        let hit = cache
            .write()
            .await
            .match_entry(&CacheKey::get("http://localhost/a"), MatchOptions::default());
        assert_eq!(hit.unwrap().body, b"fetched");
    }

    #[tokio::test]
    async fn test_add_caches_nothing_on_non_2xx() {
        use crate::strategy::testing::MockFetcher;

        let cache = store().into_shared();
        let fetcher = MockFetcher::new();
        fetcher.stub(
            "http://localhost/a",
            WorkerResponse::new(404, Vec::new(), b"gone".to_vec()),
        );

        let result = add(&cache, &WorkerRequest::get("http://localhost/a"), &fetcher).await;

        assert!(matches!(result, Err(WorkerError::Network(_))));
        assert!(cache.read().await.is_empty());
    }
}
