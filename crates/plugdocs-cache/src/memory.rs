//! Process-lifetime TTL cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Stored payload with its creation time and time-to-live.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    created: Instant,
    ttl: Duration,
}

impl CacheEntry {
    /// An entry is expired once strictly more than `ttl` has elapsed.
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) > self.ttl
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// All stored entries, expired or not.
    pub total: usize,
    /// Entries that would still be returned by `get`.
    pub active: usize,
    /// Entries past their TTL that have not been evicted yet.
    pub expired: usize,
}

/// Key-value byte store with per-entry expiry.
///
/// Entries are never returned once expired: `get` evicts them on sight, and
/// [`MemoryCache::cleanup`] removes the rest in bulk. There is no size bound.
/// The key space is expected to be one entry per fetched file or tree node.
///
/// Concurrent writers to the same key race; the last write wins.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.data.clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: another caller may have refreshed it.
        let mut entries = self.entries.write().unwrap();
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            tracing::debug!(key, "Evicted expired cache entry");
        }
        None
    }

    /// Store a value, replacing any existing entry for `key`.
    pub fn set(&self, key: &str, value: &[u8], ttl: Duration) {
        let entry = CacheEntry {
            data: value.to_vec(),
            created: Instant::now(),
            ttl,
        };
        self.entries.write().unwrap().insert(key.to_owned(), entry);
    }

    /// Remove a single entry.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.write().unwrap().remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    /// Remove all expired entries and return how many were dropped.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count total, live and expired entries.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read().unwrap();
        let expired = entries.values().filter(|e| e.is_expired(now)).count();
        CacheStats {
            total: entries.len(),
            active: entries.len() - expired,
            expired,
        }
    }

    /// Run [`MemoryCache::cleanup`] every `interval` on the tokio runtime.
    ///
    /// The task runs until the returned handle is aborted or the runtime shuts down.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                let removed = cache.cleanup();
                if removed > 0 {
                    tracing::debug!(removed, "Swept expired cache entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_set_then_get_returns_value() {
        let cache = MemoryCache::new();
        cache.set("k", b"value", MINUTE);

        assert_eq!(cache.get("k"), Some(b"value".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_after_ttl_evicts_entry() {
        let cache = MemoryCache::new();
        cache.set("k", b"value", MINUTE);

        tokio::time::advance(MINUTE + Duration::from_millis(1)).await;

        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_alive_exactly_at_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", b"value", MINUTE);

        tokio::time::advance(MINUTE).await;

        assert_eq!(cache.get("k"), Some(b"value".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_resets_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", b"old", MINUTE);
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.set("k", b"new", MINUTE);
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(cache.get("k"), Some(b"new".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_key() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("absent"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_removes_everything() {
        let cache = MemoryCache::new();
        cache.set("a", b"1", MINUTE);
        cache.set("b", b"2", MINUTE);

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_single_entry() {
        let cache = MemoryCache::new();
        cache.set("a", b"1", MINUTE);

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_and_stats() {
        let cache = MemoryCache::new();
        cache.set("short", b"1", Duration::from_secs(10));
        cache.set("long", b"2", MINUTE);

        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(
            cache.stats(),
            CacheStats {
                total: 2,
                active: 1,
                expired: 1,
            }
        );
        assert_eq!(cache.cleanup(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                total: 1,
                active: 1,
                expired: 0,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_entries() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("k", b"v", Duration::from_secs(10));
        let handle = cache.spawn_sweeper(MINUTE);

        tokio::time::sleep(MINUTE + Duration::from_secs(1)).await;

        assert_eq!(cache.len(), 0);
        handle.abort();
    }
}
