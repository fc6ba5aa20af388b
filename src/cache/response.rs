//! Bounded response cache keyed on normalized request text.
//!
//! Caches accepted analysis results so semantically identical requests
//! (case- and whitespace-insensitive) are answered without contacting a
//! provider. Entries are evicted by least-recent-use when the cache is
//! full, and expire once their age exceeds the configured time-to-live,
//! whichever comes first.
//!
//! # Architecture
//!
//! The cache sits in the orchestrator, above the fallback chain. A hit
//! bypasses provider selection, validation, and per-attempt metrics
//! entirely; hit/miss counters are emitted separately.
//!
//! Recency is tracked with a monotonically increasing use counter per
//! entry rather than an ordered map's iteration order, so the evicted
//! entry is always exactly the least recently used one. A single lock
//! guards the map; both `get` (which promotes recency) and `put` (which
//! may evict) are atomic with respect to concurrent callers.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::AnalysisResponse;
use crate::telemetry;

/// Configuration for the response cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 256.
    pub max_entries: usize,
    /// Time-to-live for cached entries. Default: 5 minutes.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            ttl: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Read-only view of the cache's current shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub ttl: Duration,
}

struct Entry {
    value: AnalysisResponse,
    inserted_at: Instant,
    last_used: u64,
}

struct Inner {
    map: HashMap<u64, Entry>,
    /// Use counter; bumped on every get/put touch.
    tick: u64,
}

/// In-memory LRU + TTL cache for accepted analysis responses.
pub struct ResponseCache {
    max_entries: usize,
    ttl: Duration,
    inner: Mutex<Inner>,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            max_entries: config.max_entries.max(1),
            ttl: config.ttl,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                tick: 0,
            }),
        }
    }

    /// Look up a cached response.
    ///
    /// An entry past its TTL is removed and reported as a miss. A hit
    /// marks the entry most recently used. Emits hit/miss metrics.
    pub fn get(&self, key: u64) -> Option<AnalysisResponse> {
        let result = self.get_at(key, Instant::now());
        if result.is_some() {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        } else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        }
        result
    }

    /// Insert (or overwrite) a response.
    ///
    /// When the cache is full, evicts the least-recently-used entry
    /// before inserting, so `size` never exceeds `max_entries`.
    pub fn put(&self, key: u64, value: AnalysisResponse) {
        self.put_at(key, value, Instant::now());
    }

    /// Remove a single entry. Returns whether it was present.
    pub fn evict(&self, key: u64) -> bool {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.map.remove(&key).is_some()
    }

    /// Current size and configured bounds.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache lock poisoned");
        CacheStats {
            size: inner.map.len(),
            max_entries: self.max_entries,
            ttl: self.ttl,
        }
    }

    fn get_at(&self, key: u64, now: Instant) -> Option<AnalysisResponse> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        let expired = match inner.map.get(&key) {
            Some(entry) => now.duration_since(entry.inserted_at) > self.ttl,
            None => return None,
        };
        if expired {
            inner.map.remove(&key);
            return None;
        }

        inner.tick += 1;
        let tick = inner.tick;
        let entry = inner.map.get_mut(&key).expect("entry checked above");
        entry.last_used = tick;
        Some(entry.value.clone())
    }

    fn put_at(&self, key: u64, value: AnalysisResponse, now: Instant) {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.tick += 1;
        let tick = inner.tick;

        // Replacement never triggers eviction.
        if !inner.map.contains_key(&key) {
            while inner.map.len() >= self.max_entries {
                let lru_key = inner
                    .map
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(&k, _)| k)
                    .expect("non-empty map at capacity");
                inner.map.remove(&lru_key);
            }
        }

        inner.map.insert(
            key,
            Entry {
                value,
                inserted_at: now,
                last_used: tick,
            },
        );
    }
}

/// Compute a cache key from the request text.
///
/// The text is normalized (lowercased, whitespace collapsed) before
/// hashing so that semantically identical requests collide. Uses
/// `DefaultHasher` (SipHash); deterministic within a process lifetime,
/// which is sufficient for an in-memory cache.
pub fn cache_key(text: &str) -> u64 {
    let normalized = normalize(text);
    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    hasher.finish()
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(summary: &str) -> AnalysisResponse {
        AnalysisResponse {
            summary: summary.to_string(),
            impact_points: vec!["point one".into(), "point two".into()],
            confidence: 0.9,
            sentiment: None,
            provider: "test".into(),
            raw: None,
        }
    }

    #[test]
    fn cache_key_deterministic() {
        assert_eq!(cache_key("Bitcoin ETF approved"), cache_key("Bitcoin ETF approved"));
    }

    #[test]
    fn cache_key_normalizes_case_and_whitespace() {
        assert_eq!(
            cache_key("Bitcoin   ETF\napproved"),
            cache_key("bitcoin etf approved")
        );
        assert_ne!(cache_key("bitcoin etf approved"), cache_key("bitcoin etf rejected"));
    }

    #[test]
    fn expired_entry_is_a_miss_and_removed() {
        let cache = ResponseCache::new(&CacheConfig::new().ttl(Duration::from_secs(10)));
        let start = Instant::now();

        cache.put_at(1, response("a"), start);
        assert!(cache.get_at(1, start + Duration::from_secs(9)).is_some());
        assert!(cache.get_at(1, start + Duration::from_secs(11)).is_none());
        // The expired entry is gone, not just hidden.
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn entry_at_exact_ttl_is_still_fresh() {
        let cache = ResponseCache::new(&CacheConfig::new().ttl(Duration::from_secs(10)));
        let start = Instant::now();

        cache.put_at(1, response("a"), start);
        assert!(cache.get_at(1, start + Duration::from_secs(10)).is_some());
    }

    #[test]
    fn replacement_does_not_evict_neighbours() {
        let cache = ResponseCache::new(&CacheConfig::new().max_entries(2));
        let now = Instant::now();

        cache.put_at(1, response("a"), now);
        cache.put_at(2, response("b"), now);
        cache.put_at(1, response("a2"), now);

        assert_eq!(cache.stats().size, 2);
        assert_eq!(cache.get_at(1, now).unwrap().summary, "a2");
        assert!(cache.get_at(2, now).is_some());
    }
}
