//! Response cache keyed by target URL.
//!
//! # Responsibilities
//! - Replay a successful upstream payload for a short time
//! - Keep its own size in check without a background task
//!
//! # Design Decisions
//! - An entry is fresh while `now - stored_at < ttl`
//! - Only 2xx payloads are stored; errors are never replayed
//! - The ceiling is soft: when it is exceeded, expired entries are swept,
//!   which may leave the cache above the ceiling if everything is fresh

use std::sync::Arc;

use bytes::Bytes;

use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::observability::metrics;
use crate::store::{MemoryStore, Store};

/// A stored upstream payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub status: u16,
    pub payload: Bytes,
    pub content_type: Option<String>,
    pub stored_at_ms: u64,
}

impl CacheEntry {
    fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.stored_at_ms) < ttl_ms
    }
}

pub struct ResponseCache {
    store: Arc<dyn Store<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
    max_entries: usize,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_store(config, clock, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn Store<String, CacheEntry>>,
    ) -> Self {
        Self {
            store,
            clock,
            ttl_ms: config.ttl_ms,
            max_entries: config.max_entries,
            enabled: config.enabled,
        }
    }

    /// Return the entry for `url` if one was stored less than a TTL ago.
    pub fn lookup(&self, url: &str) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }

        let now = self.clock.now_ms();
        let hit = self
            .store
            .get(&url.to_string())
            .filter(|entry| entry.is_fresh(now, self.ttl_ms));

        metrics::record_cache_lookup(hit.is_some());
        hit
    }

    /// Remember a payload for `url`. Returns whether it was stored.
    pub fn store(
        &self,
        url: &str,
        status: u16,
        payload: Bytes,
        content_type: Option<String>,
    ) -> bool {
        if !self.enabled || !(200..300).contains(&status) {
            return false;
        }

        let entry = CacheEntry {
            status,
            payload,
            content_type,
            stored_at_ms: self.clock.now_ms(),
        };
        self.store.insert(url.to_string(), entry);

        if self.store.len() > self.max_entries {
            self.sweep();
        }
        metrics::record_cache_size(self.store.len());
        true
    }

    /// Drop every entry older than the TTL.
    pub fn sweep(&self) {
        let now = self.clock.now_ms();
        let ttl_ms = self.ttl_ms;
        let before = self.store.len();

        self.store
            .retain(&mut |_, entry| now.saturating_sub(entry.stored_at_ms) <= ttl_ms);

        let after = self.store.len();
        tracing::debug!(removed = before.saturating_sub(after), remaining = after, "Swept response cache");
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.store.len())
            .field("ttl_ms", &self.ttl_ms)
            .field("max_entries", &self.max_entries)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    fn config(max_entries: usize) -> CacheConfig {
        CacheConfig {
            enabled: true,
            ttl_ms: 30_000,
            max_entries,
        }
    }

    #[test]
    fn fresh_entry_is_replayed() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResponseCache::new(&config(100), clock.clone());

        assert!(cache.store(
            "https://example.com/",
            200,
            Bytes::from_static(b"<html>"),
            Some("text/html".into())
        ));
        clock.advance(Duration::from_secs(29));

        let entry = cache.lookup("https://example.com/").unwrap();
        assert_eq!(entry.payload, Bytes::from_static(b"<html>"));
        assert_eq!(entry.content_type.as_deref(), Some("text/html"));
        assert_eq!(entry.status, 200);
    }

    #[test]
    fn entry_expires_at_ttl() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResponseCache::new(&config(100), clock.clone());

        cache.store("u", 200, Bytes::from_static(b"x"), None);
        clock.advance(Duration::from_millis(30_000));

        assert!(cache.lookup("u").is_none());
    }

    #[test]
    fn non_success_is_not_stored() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResponseCache::new(&config(100), clock);

        assert!(!cache.store("u", 404, Bytes::from_static(b"missing"), None));
        assert!(!cache.store("u", 500, Bytes::new(), None));
        assert!(cache.lookup("u").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_are_not_normalized() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResponseCache::new(&config(100), clock);

        cache.store("https://example.com", 200, Bytes::from_static(b"a"), None);
        assert!(cache.lookup("https://example.com/").is_none());
    }

    #[test]
    fn overflow_sweeps_expired_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResponseCache::new(&config(2), clock.clone());

        cache.store("a", 200, Bytes::new(), None);
        cache.store("b", 200, Bytes::new(), None);
        clock.advance(Duration::from_secs(31));

        cache.store("c", 200, Bytes::new(), None);

        assert_eq!(cache.len(), 1);
        assert!(cache.lookup("c").is_some());
    }

    #[test]
    fn overflow_keeps_fresh_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = ResponseCache::new(&config(2), clock);

        for key in ["a", "b", "c"] {
            cache.store(key, 200, Bytes::new(), None);
        }

        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let clock = Arc::new(ManualClock::new(0));
        let mut cfg = config(10);
        cfg.enabled = false;
        let cache = ResponseCache::new(&cfg, clock);

        assert!(!cache.store("u", 200, Bytes::new(), None));
        assert!(cache.lookup("u").is_none());
    }
}
