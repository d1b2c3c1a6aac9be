//! Integration tests for local-mode expiry emulation and key matching

use cachemem::{BackendMode, CacheConfig, CacheFacade, CacheValue};
use std::time::Duration;

fn local_cache() -> CacheFacade {
    let cache = CacheFacade::local(&CacheConfig::default());
    assert_eq!(cache.mode(), BackendMode::Local);
    cache
}

#[tokio::test]
async fn test_increment_yields_one_two_three() {
    let cache = local_cache();
    assert_eq!(cache.increment("k").await, 1);
    assert_eq!(cache.increment("k").await, 2);
    assert_eq!(cache.increment("k").await, 3);
}

#[tokio::test]
async fn test_expire_deletes_after_deadline_not_before() {
    let cache = local_cache();
    cache.set("k", "v").await;
    assert_eq!(cache.expire("k", Some(1)).await, 1);

    assert_eq!(cache.get("k", None).await, Some(CacheValue::from("v")));

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(cache.get("k", None).await, None);
    assert_eq!(cache.fallback_len(), 0);
}

#[tokio::test]
async fn test_ttl_decreases_and_reaches_zero() {
    let cache = local_cache();
    cache.set("k", "v").await;
    cache.expire("k", Some(5)).await;

    let first = cache.ttl("k").await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    let second = cache.ttl("k").await;

    assert_eq!(first, 5);
    assert!((first - second - 1).abs() <= 1, "ttl went {first} -> {second}");
    assert!(second < first);

    cache.expire("k", Some(1)).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(cache.ttl("k").await, 0);
}

#[tokio::test]
async fn test_expire_without_duration_uses_default() {
    let config = CacheConfig {
        default_expiration_seconds: 3,
        ..CacheConfig::default()
    };
    let cache = CacheFacade::local(&config);
    cache.set("k", "v").await;

    assert_eq!(cache.expire("k", None).await, 1);
    assert_eq!(cache.ttl("k").await, 3);
}

#[tokio::test]
async fn test_set_does_not_clear_pending_expiry() {
    let cache = local_cache();
    cache.set("k", "old").await;
    cache.expire("k", Some(1)).await;
    cache.set("k", "new").await;

    assert_eq!(cache.ttl("k").await, 1);
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(cache.get("k", Some("gone".into())).await, Some("gone".into()));
}

#[tokio::test]
async fn test_keys_matches_by_word_characters() {
    let cache = local_cache();
    for key in ["user:1", "user:2", "order:1"] {
        cache.set(key, "x").await;
    }

    let mut users = cache.keys("user").await;
    users.sort();
    assert_eq!(users, vec!["user:1", "user:2"]);

    assert_eq!(cache.keys("user:*").await.len(), 2);
    assert_eq!(cache.keys("*").await.len(), 3);
    assert_eq!(cache.keys("order").await, vec!["order:1"]);
}

#[tokio::test]
async fn test_integer_values_round_trip_locally() {
    let cache = local_cache();
    assert_eq!(cache.set("n", 41i64).await, CacheValue::Int(41));
    assert_eq!(cache.increment("n").await, 42);
    assert_eq!(cache.get("n", None).await.and_then(|v| v.as_int()), Some(42));
}
