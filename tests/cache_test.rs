//! Response cache invariants: LRU eviction order, size bound, key
//! normalization, explicit eviction.

use std::time::Duration;

use huginn::cache::{CacheConfig, ResponseCache, cache_key};
use huginn::AnalysisResponse;

fn response(summary: &str) -> AnalysisResponse {
    AnalysisResponse {
        summary: summary.to_string(),
        impact_points: vec!["one".into(), "two".into()],
        confidence: 0.9,
        sentiment: None,
        provider: "test".into(),
        raw: None,
    }
}

#[test]
fn put_then_get_roundtrip() {
    let cache = ResponseCache::new(&CacheConfig::default());
    let key = cache_key("Bitcoin ETF approved");

    cache.put(key, response("stored"));
    let hit = cache.get(key).expect("fresh entry must hit");
    assert_eq!(hit.summary, "stored");
}

#[test]
fn normalized_texts_share_an_entry() {
    let cache = ResponseCache::new(&CacheConfig::default());
    cache.put(cache_key("Bitcoin   ETF approved"), response("shared"));

    let hit = cache.get(cache_key("bitcoin etf APPROVED"));
    assert_eq!(hit.unwrap().summary, "shared");
}

#[test]
fn third_insert_evicts_least_recently_used() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(2));
    let (k1, k2, k3) = (cache_key("k1"), cache_key("k2"), cache_key("k3"));

    cache.put(k1, response("one"));
    cache.put(k2, response("two"));
    cache.put(k3, response("three"));

    assert!(cache.get(k1).is_none(), "k1 was least recently used");
    assert!(cache.get(k2).is_some());
    assert!(cache.get(k3).is_some());
}

#[test]
fn get_promotes_recency_before_eviction() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(2));
    let (k1, k2, k3) = (cache_key("k1"), cache_key("k2"), cache_key("k3"));

    cache.put(k1, response("one"));
    cache.put(k2, response("two"));
    // Touch k1 so k2 becomes the LRU entry.
    assert!(cache.get(k1).is_some());
    cache.put(k3, response("three"));

    assert!(cache.get(k1).is_some());
    assert!(cache.get(k2).is_none(), "k2 was least recently used");
    assert!(cache.get(k3).is_some());
}

#[test]
fn size_never_exceeds_max_entries() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(4));

    for i in 0..50 {
        cache.put(cache_key(&format!("text {i}")), response("x"));
        assert!(cache.stats().size <= 4);
    }
    assert_eq!(cache.stats().size, 4);
}

#[test]
fn explicit_evict_removes_only_its_entry() {
    let cache = ResponseCache::new(&CacheConfig::default());
    let (k1, k2) = (cache_key("k1"), cache_key("k2"));

    cache.put(k1, response("one"));
    cache.put(k2, response("two"));

    assert!(cache.evict(k1));
    assert!(!cache.evict(k1), "double evict reports absence");
    assert!(cache.get(k1).is_none());
    assert!(cache.get(k2).is_some());
}

#[test]
fn put_replaces_existing_value() {
    let cache = ResponseCache::new(&CacheConfig::new().max_entries(2));
    let key = cache_key("same text");

    cache.put(key, response("old"));
    cache.put(key, response("new"));

    assert_eq!(cache.stats().size, 1);
    assert_eq!(cache.get(key).unwrap().summary, "new");
}

#[test]
fn stats_report_configured_bounds() {
    let config = CacheConfig::new()
        .max_entries(8)
        .ttl(Duration::from_secs(120));
    let cache = ResponseCache::new(&config);

    let stats = cache.stats();
    assert_eq!(stats.size, 0);
    assert_eq!(stats.max_entries, 8);
    assert_eq!(stats.ttl, Duration::from_secs(120));
}

#[test]
fn concurrent_puts_respect_the_size_bound() {
    use std::sync::Arc;

    let cache = Arc::new(ResponseCache::new(&CacheConfig::new().max_entries(8)));
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..100 {
                    let key = cache_key(&format!("worker {worker} item {i}"));
                    cache.put(key, response("x"));
                    cache.get(key);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.stats().size <= 8);
}
