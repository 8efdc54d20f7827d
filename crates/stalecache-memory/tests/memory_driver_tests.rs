use std::sync::Arc;
use std::time::Duration;

use stalecache_core::Driver;
use stalecache_memory::{MemoryConfig, MemoryDriver};
use tokio_test::{assert_err, assert_ok};

#[tokio::test(start_paused = true)]
async fn set_then_get_returns_value_with_full_ttl() {
    let driver = MemoryDriver::with_defaults();

    assert_ok!(
        driver
            .set("orders", "42", b"order-42", Duration::from_secs(3))
            .await
    );

    let hit = assert_ok!(driver.get("orders", "42").await);
    assert_eq!(hit.value, b"order-42");
    assert_eq!(hit.ttl, Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn oversized_ttl_is_stored_without_overflow() {
    let driver = MemoryDriver::with_defaults();

    assert_ok!(driver.set("orders", "42", b"order-42", Duration::MAX).await);

    tokio::time::advance(Duration::from_secs(86_400)).await;
    let hit = assert_ok!(driver.get("orders", "42").await);
    assert_eq!(hit.value, b"order-42");
    assert!(hit.ttl > Duration::from_secs(86_400 * 365));
}

#[tokio::test(start_paused = true)]
async fn expired_item_is_not_found_and_swept_by_next_gc_cycle() {
    let driver = MemoryDriver::new(MemoryConfig::with_gc_interval(Duration::from_secs(10)));

    driver
        .set("orders", "a", b"1", Duration::from_secs(3))
        .await
        .unwrap();
    driver
        .set("orders", "b", b"2", Duration::from_secs(3))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(4)).await;

    // Lazy expiry removes the entry that was read
    let err = assert_err!(driver.get("orders", "a").await);
    assert!(err.is_not_found());
    assert!(!driver.contains("orders", "a"));

    // The unread one stays until the collector runs
    assert!(driver.contains("orders", "b"));

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert!(!driver.contains("orders", "b"));
    assert!(driver.is_empty());
}

#[tokio::test(start_paused = true)]
async fn collect_garbage_keeps_live_items() {
    let mut driver = MemoryDriver::with_defaults();
    driver.stop_gc();

    driver
        .set("orders", "short", b"1", Duration::from_secs(1))
        .await
        .unwrap();
    driver
        .set("orders", "long", b"2", Duration::from_secs(60))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(2)).await;

    assert_eq!(driver.collect_garbage(), 1);
    assert!(driver.contains("orders", "long"));
    assert_eq!(driver.cache_len("orders"), 1);
}

#[tokio::test]
async fn stored_bytes_do_not_alias_caller_buffers() {
    let driver = MemoryDriver::with_defaults();
    let mut buffer = b"original".to_vec();

    driver
        .set("c", "k", &buffer, Duration::from_secs(60))
        .await
        .unwrap();
    buffer.copy_from_slice(b"mutated!");

    let mut hit = driver.get("c", "k").await.unwrap();
    assert_eq!(hit.value, b"original");

    hit.value.clear();
    assert_eq!(driver.get("c", "k").await.unwrap().value, b"original");
}

#[tokio::test]
async fn set_replaces_value_and_deadline() {
    let driver = MemoryDriver::with_defaults();

    driver
        .set("c", "k", b"v1", Duration::from_secs(1))
        .await
        .unwrap();
    driver
        .set("c", "k", b"v2", Duration::from_secs(60))
        .await
        .unwrap();

    let hit = driver.get("c", "k").await.unwrap();
    assert_eq!(hit.value, b"v2");
    assert!(hit.ttl > Duration::from_secs(50));
}

#[tokio::test]
async fn invalidate_and_invalidate_all() {
    let driver = MemoryDriver::with_defaults();
    for key in ["1", "2", "3"] {
        driver
            .set("orders", key, b"x", Duration::from_secs(60))
            .await
            .unwrap();
    }
    driver
        .set("users", "1", b"x", Duration::from_secs(60))
        .await
        .unwrap();

    driver.invalidate("orders", "1").await.unwrap();
    assert!(driver.get("orders", "1").await.is_err());
    assert!(driver.get("orders", "2").await.is_ok());

    driver.invalidate_all("orders").await;
    assert_eq!(driver.cache_len("orders"), 0);
    assert!(driver.get("users", "1").await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_and_writers() {
    let driver = Arc::new(MemoryDriver::with_defaults());
    let mut handles = vec![];

    for i in 0..32 {
        let driver = Arc::clone(&driver);
        handles.push(tokio::spawn(async move {
            let key = format!("k{}", i % 8);
            for _ in 0..50 {
                driver
                    .set("c", &key, key.as_bytes(), Duration::from_secs(60))
                    .await
                    .unwrap();
                let hit = driver.get("c", &key).await.unwrap();
                assert_eq!(hit.value, key.as_bytes());
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(driver.cache_len("c"), 8);
}
