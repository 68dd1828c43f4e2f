//! Keyed, TTL-expiring response cache.
//!
//! Entries are keyed by request fingerprint (the full request URL, query
//! string included). Every entry carries the TTL of the category it was
//! stored under, so reference lists and geometry can age at different rates.
//! Expired entries are evicted lazily on read and by a periodic sweep.
//! There is no size bound.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ApiConfig;

/// Freshness class of a cached response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// Reference lists and single entities (sectors, products, regions...).
    Reference,
    /// GeoJSON geometry.
    Geographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub reference_ttl: Duration,
    pub geographic_ttl: Duration,
}

impl CachePolicy {
    pub const fn ttl(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::Reference => self.reference_ttl,
            CacheCategory::Geographic => self.geographic_ttl,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for CachePolicy {
    fn from(config: &ApiConfig) -> Self {
        Self {
            reference_ttl: config.reference_ttl,
            geographic_ttl: config.geographic_ttl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: Instant,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// An entry is valid iff `now - timestamp <= ttl`.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) <= self.ttl
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug)]
pub struct ResponseCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    policy: CachePolicy,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            policy,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Returns the cached value if present and unexpired.
    ///
    /// An expired entry is removed on the way out. A poisoned lock counts as a
    /// miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let Ok(mut entries) = self.entries.lock() else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        match entries.get(key) {
            Some(entry) if entry.is_valid_at(now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.data.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key, "evicted expired cache entry on read");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores `data` under `key` with the current timestamp, replacing any
    /// previous entry.
    pub fn set(&self, key: impl Into<String>, data: T, category: CacheCategory) {
        let entry = CacheEntry {
            data,
            timestamp: Instant::now(),
            ttl: self.policy.ttl(category),
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), entry);
        }
    }

    /// Drops a single entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid_at(now));
        let removed = before - entries.len();

        self.evictions
            .fetch_add(u64::try_from(removed).unwrap_or(u64::MAX), Ordering::Relaxed);
        removed
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl<T> ResponseCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawns the background sweep. The task ends once the cache is dropped.
    pub fn spawn_sweeper(cache: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(cache);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    tracing::debug!("response cache dropped, stopping sweeper");
                    break;
                };
                let removed = cache.sweep();
                if removed > 0 {
                    tracing::debug!(removed, remaining = cache.len(), "swept expired cache entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CachePolicy {
        CachePolicy {
            reference_ttl: Duration::from_secs(300),
            geographic_ttl: Duration::from_secs(600),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn get_returns_value_within_ttl() {
        let cache = ResponseCache::new(policy());
        cache.set("/api/v1/filieres/?skip=0&limit=100", "sectors", CacheCategory::Reference);

        tokio::time::advance(Duration::from_secs(300)).await;

        assert_eq!(
            cache.get("/api/v1/filieres/?skip=0&limit=100"),
            Some("sectors")
        );
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn get_evicts_after_ttl() {
        let cache = ResponseCache::new(policy());
        cache.set("k", 1_u32, CacheCategory::Reference);

        tokio::time::advance(Duration::from_secs(301)).await;

        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn geographic_entries_outlive_reference_entries() {
        let cache = ResponseCache::new(policy());
        cache.set("ref", "a", CacheCategory::Reference);
        cache.set("geo", "b", CacheCategory::Geographic);

        tokio::time::advance(Duration::from_secs(450)).await;

        assert_eq!(cache.get("ref"), None);
        assert_eq!(cache.get("geo"), Some("b"));

        tokio::time::advance(Duration::from_secs(151)).await;
        assert_eq!(cache.get("geo"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn set_overwrites_and_refreshes_timestamp() {
        let cache = ResponseCache::new(policy());
        cache.set("k", "old", CacheCategory::Reference);
        tokio::time::advance(Duration::from_secs(200)).await;

        cache.set("k", "new", CacheCategory::Reference);
        tokio::time::advance(Duration::from_secs(200)).await;

        assert_eq!(cache.get("k"), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired_entries() {
        let cache = ResponseCache::new(policy());
        cache.set("ref", 1, CacheCategory::Reference);
        cache.set("geo", 2, CacheCategory::Geographic);

        tokio::time::advance(Duration::from_secs(400)).await;

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("geo"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweeper_drops_expired_entries() {
        let cache = Arc::new(ResponseCache::new(policy()));
        cache.set("ref", 1, CacheCategory::Reference);
        let handle = ResponseCache::spawn_sweeper(&cache, Duration::from_secs(60));
        settle().await;

        for _ in 0..6 {
            tokio::time::advance(Duration::from_secs(61)).await;
            settle().await;
        }

        assert!(cache.is_empty());
        assert_eq!(cache.stats().evictions, 1);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_stops_when_cache_is_dropped() {
        let cache = Arc::new(ResponseCache::<u8>::new(policy()));
        let handle = ResponseCache::spawn_sweeper(&cache, Duration::from_secs(1));
        drop(cache);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;

        assert!(handle.is_finished());
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = ResponseCache::new(policy());
        cache.set("a", 1, CacheCategory::Reference);
        cache.set("b", 2, CacheCategory::Geographic);

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
