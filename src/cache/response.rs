//! Bounded, time-limited memo of normalized results.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::key::CacheKey;
use crate::types::NormalizedResult;

pub const DEFAULT_MAX_ENTRIES: usize = 10;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}

struct CacheEntry {
    value: NormalizedResult,
    created_at: Instant,
}

/// Fixed-capacity response cache with insertion-order eviction.
///
/// Reads use `peek`, so a lookup never changes eviction order: the entry
/// that was inserted longest ago is the one dropped when a new key arrives
/// at capacity. Expired entries are dropped when they are read. All
/// mutation happens under one lock, so the entry count can never exceed
/// `max_entries`.
pub struct ResponseCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
    stats: AtomicStats,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            ttl: config.ttl,
            stats: AtomicStats::default(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<NormalizedResult> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = match entries.peek(key) {
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Some(e) => e.created_at.elapsed() >= self.ttl,
        };
        if expired {
            entries.pop(key);
            self.stats.expirations.fetch_add(1, Ordering::Relaxed);
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "cache entry expired");
            return None;
        }
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
        entries.peek(key).map(|e| e.value.clone())
    }

    pub fn set(&self, key: CacheKey, value: NormalizedResult) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
        };
        // `push` hands back the displaced pair: the old value for a known key,
        // or the oldest entry when a new key arrives at capacity.
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(evicted = %evicted, "cache entry evicted");
            }
        }
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Stored entries, including any that have expired but not yet been read.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .peek(key)
            .map(|e| e.created_at.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cap()
            .get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn result(n: usize) -> NormalizedResult {
        NormalizedResult {
            content: format!("answer {n}"),
            model: "gpt-3.5-turbo".into(),
            usage: None,
        }
    }

    fn key(n: usize) -> CacheKey {
        CacheKey::new(format!("k{n}"))
    }

    #[test]
    fn test_capacity_bound_drops_earliest() {
        let cache = ResponseCache::default();
        let k = 4;
        for n in 0..DEFAULT_MAX_ENTRIES + k {
            cache.set(key(n), result(n));
        }
        assert_eq!(cache.len(), DEFAULT_MAX_ENTRIES);
        for n in 0..k {
            assert!(cache.get(&key(n)).is_none(), "k{n} should be evicted");
        }
        for n in k..DEFAULT_MAX_ENTRIES + k {
            assert_eq!(cache.get(&key(n)), Some(result(n)));
        }
        assert_eq!(cache.stats().evictions, k as u64);
    }

    #[test]
    fn test_reads_do_not_change_eviction_order() {
        let cache = ResponseCache::new(CacheConfig::new().with_max_entries(2));
        cache.set(key(0), result(0));
        cache.set(key(1), result(1));
        assert!(cache.get(&key(0)).is_some());
        cache.set(key(2), result(2));
        assert!(cache.get(&key(0)).is_none());
        assert!(cache.get(&key(1)).is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = ResponseCache::new(CacheConfig::new().with_max_entries(2));
        cache.set(key(0), result(0));
        cache.set(key(1), result(1));
        cache.set(key(1), result(9));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(1)), Some(result(9)));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let ttl = Duration::from_secs(300);
        let cache = ResponseCache::new(CacheConfig::new().with_ttl(ttl));
        cache.set(key(1), result(1));

        tokio::time::advance(ttl - Duration::from_millis(1)).await;
        assert!(cache.contains(&key(1)));
        assert!(cache.get(&key(1)).is_some());

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let cache = ResponseCache::new(CacheConfig::new().with_max_entries(0));
        assert_eq!(cache.capacity(), 1);
        cache.set(key(1), result(1));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_sets_respect_bound() {
        let cache = Arc::new(ResponseCache::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for n in 0..100 {
                        cache.set(key(t * 1000 + n), result(n));
                        assert!(cache.len() <= DEFAULT_MAX_ENTRIES);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn test_hit_ratio() {
        let cache = ResponseCache::default();
        cache.set(key(1), result(1));
        cache.get(&key(1));
        cache.get(&key(2));
        assert_eq!(cache.stats().hit_ratio(), 0.5);
    }
}
