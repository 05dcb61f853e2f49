//! Unit tests for the size-accounted LRU.

use super::*;
use crate::view::ByteView;
use std::sync::{Arc, Mutex};

// ========== Basic Operations ==========

#[test]
fn test_get_hit_and_miss() {
    let mut cache = Lru::new(0);
    cache.add("key1", ByteView::from("1234"));

    assert_eq!(cache.get("key1"), Some(ByteView::from("1234")));
    assert_eq!(cache.get("key2"), None);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_add_accounts_key_and_value_bytes() {
    let mut cache = Lru::new(0);
    cache.add("a", ByteView::from("1234"));
    assert_eq!(cache.used_bytes(), 5);

    cache.add("bb", ByteView::from("12"));
    assert_eq!(cache.used_bytes(), 9);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_update_adjusts_used_by_delta() {
    let mut cache = Lru::new(0);
    cache.add("k", ByteView::from("1234"));
    assert_eq!(cache.used_bytes(), 5);

    cache.add("k", ByteView::from("123456"));
    assert_eq!(cache.used_bytes(), 7);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("k"), Some(ByteView::from("123456")));
}

#[test]
fn test_get_does_not_change_used() {
    let mut cache = Lru::new(0);
    cache.add("k", ByteView::from("1234"));
    let before = cache.used_bytes();
    cache.get("k");
    assert_eq!(cache.used_bytes(), before);
}

#[test]
fn test_remove_oldest_on_empty_is_noop() {
    let mut cache = Lru::new(16);
    cache.remove_oldest();
    assert!(cache.is_empty());
    assert_eq!(cache.used_bytes(), 0);
}

// ========== Eviction ==========

#[test]
fn test_eviction_order_is_least_recently_used() {
    // Capacity fits exactly two of these entries.
    let mut cache = Lru::new(10);
    cache.add("a", ByteView::from("1234"));
    cache.add("b", ByteView::from("1234"));
    cache.add("c", ByteView::from("1"));

    assert!(!cache.contains("a"));
    assert!(cache.contains("b"));
    assert!(cache.contains("c"));
    assert_eq!(cache.len(), 2);
    assert!(cache.used_bytes() <= 10);
}

#[test]
fn test_get_promotes_entry_out_of_eviction() {
    let mut cache = Lru::new(10);
    cache.add("a", ByteView::from("1234"));
    cache.add("b", ByteView::from("1234"));

    // Touch "a" so "b" becomes the cold entry.
    assert!(cache.get("a").is_some());
    cache.add("c", ByteView::from("1"));

    assert!(cache.contains("a"));
    assert!(!cache.contains("b"));
    assert!(cache.contains("c"));
}

#[test]
fn test_zero_max_bytes_never_evicts() {
    let mut cache = Lru::new(0);
    for i in 0..1000 {
        cache.add(&format!("key{i}"), ByteView::from("value"));
    }
    assert_eq!(cache.len(), 1000);
}

#[test]
fn test_eviction_callback_fires_once_per_evicted_key() {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&evicted);
    let mut cache = Lru::with_eviction_callback(
        10,
        Box::new(move |key, _value| sink.lock().unwrap().push(key.to_owned())),
    );

    cache.add("a", ByteView::from("1234"));
    cache.add("b", ByteView::from("1234"));
    cache.add("c", ByteView::from("1"));

    assert_eq!(*evicted.lock().unwrap(), vec!["a".to_owned()]);
}

#[test]
fn test_callback_sees_evicted_value() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut cache = Lru::with_eviction_callback(
        6,
        Box::new(move |key, value| sink.lock().unwrap().push((key.to_owned(), value.to_vec()))),
    );

    cache.add("x", ByteView::from("12345"));
    cache.add("y", ByteView::from("12345"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], ("x".to_owned(), b"12345".to_vec()));
}

// ========== Stats ==========

#[test]
fn test_stats_track_hits_misses_evictions() {
    let mut cache = Lru::new(10);
    cache.add("a", ByteView::from("1234"));
    cache.add("b", ByteView::from("1234"));

    assert!(cache.get("a").is_some());
    assert!(cache.get("nope").is_none());
    cache.add("c", ByteView::from("1"));

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.evictions, 1);
}

#[test]
fn test_hit_rate() {
    let stats = CacheStats {
        hits: 3,
        misses: 1,
        evictions: 0,
    };
    assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    assert!((CacheStats::default().hit_rate()).abs() < f64::EPSILON);
}
