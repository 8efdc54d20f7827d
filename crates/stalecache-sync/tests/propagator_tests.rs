use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use stalecache_core::{CacheError, Driver, Result};
use stalecache_memory::MemoryDriver;
use stalecache_sync::{BroadcastBus, Bus, InvalidationMessage, PayloadStream, Propagator};
use tokio_test::assert_err;

const TTL: Duration = Duration::from_secs(60);

struct Node {
    local: Arc<MemoryDriver>,
    driver: Propagator,
}

async fn node(bus: &BroadcastBus) -> Node {
    let local = Arc::new(MemoryDriver::with_defaults());
    let driver = Propagator::start(local.clone(), Arc::new(bus.clone()))
        .await
        .unwrap();
    Node { local, driver }
}

/// Polls until `check` holds or one second passes.
async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Bus whose publishes always fail and which never delivers anything.
struct FailingBus {
    attempts: AtomicUsize,
}

#[async_trait]
impl Bus for FailingBus {
    async fn publish(&self, _payload: Vec<u8>) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::propagation("broken", "connection refused"))
    }

    async fn subscribe(&self) -> Result<PayloadStream> {
        Ok(Box::pin(futures::stream::pending::<Vec<u8>>()))
    }

    fn subject(&self) -> &str {
        "broken"
    }
}

#[tokio::test]
async fn invalidate_reaches_peer_node() {
    let bus = BroadcastBus::new("test.invalidations");
    let a = node(&bus).await;
    let b = node(&bus).await;
    assert_ne!(a.driver.instance_id(), b.driver.instance_id());

    for n in [&a, &b] {
        n.driver.set("orders", "42", b"order", TTL).await.unwrap();
        n.driver.set("orders", "43", b"order", TTL).await.unwrap();
    }

    a.driver.invalidate("orders", "42").await.unwrap();

    // Local effect is immediate
    assert!(!a.local.contains("orders", "42"));
    assert!(eventually(|| !b.local.contains("orders", "42")).await);
    assert!(b.local.contains("orders", "43"));
}

#[tokio::test]
async fn invalidate_all_reaches_peer_node() {
    let bus = BroadcastBus::new("test.invalidations");
    let a = node(&bus).await;
    let b = node(&bus).await;

    b.driver.set("orders", "1", b"x", TTL).await.unwrap();
    b.driver.set("users", "1", b"x", TTL).await.unwrap();

    a.driver.invalidate_all("orders").await;

    assert!(eventually(|| b.local.cache_len("orders") == 0).await);
    assert!(b.local.contains("users", "1"));
}

#[tokio::test]
async fn own_broadcast_is_not_reprocessed() {
    let bus = BroadcastBus::new("test.invalidations");
    let a = node(&bus).await;
    let mut observer = bus.subscribe().await.unwrap();

    a.driver.invalidate("orders", "42").await.unwrap();
    let first = observer.next().await.unwrap();
    assert_eq!(
        InvalidationMessage::decode(&first).unwrap().sender,
        a.driver.instance_id()
    );

    // Re-populate after the broadcast; the echo must not remove it
    a.driver.set("orders", "42", b"fresh", TTL).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(a.local.contains("orders", "42"));

    // Only one event was ever published: no re-publication by the listener
    assert!(
        tokio::time::timeout(Duration::from_millis(50), observer.next())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn get_and_set_pass_through_without_publishing() {
    let bus = BroadcastBus::new("test.invalidations");
    let a = node(&bus).await;
    let b = node(&bus).await;
    let mut observer = bus.subscribe().await.unwrap();

    a.driver.set("orders", "1", b"only-on-a", TTL).await.unwrap();
    assert_eq!(
        a.driver.get("orders", "1").await.unwrap().value,
        b"only-on-a"
    );

    // Values are never replicated
    assert!(b.driver.get("orders", "1").await.unwrap_err().is_not_found());
    assert!(
        tokio::time::timeout(Duration::from_millis(50), observer.next())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn publish_failure_surfaces_on_invalidate_but_local_effect_stays() {
    let local = Arc::new(MemoryDriver::with_defaults());
    let bus = Arc::new(FailingBus {
        attempts: AtomicUsize::new(0),
    });
    let driver = Propagator::start(local.clone(), bus.clone()).await.unwrap();

    driver.set("orders", "42", b"x", TTL).await.unwrap();

    let err = assert_err!(driver.invalidate("orders", "42").await);
    assert!(matches!(err, CacheError::Propagation { .. }));
    assert!(!local.contains("orders", "42"));
    assert_eq!(bus.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn publish_failure_is_swallowed_on_invalidate_all() {
    let local = Arc::new(MemoryDriver::with_defaults());
    let bus = Arc::new(FailingBus {
        attempts: AtomicUsize::new(0),
    });
    let driver = Propagator::start(local.clone(), bus.clone()).await.unwrap();

    driver.set("orders", "1", b"x", TTL).await.unwrap();
    driver.invalidate_all("orders").await;

    assert_eq!(local.cache_len("orders"), 0);
    assert_eq!(bus.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stopped_listener_ignores_peers() {
    let bus = BroadcastBus::new("test.invalidations");
    let a = node(&bus).await;
    let b = node(&bus).await;

    b.driver.stop_listening();
    tokio::task::yield_now().await;

    b.driver.set("orders", "1", b"x", TTL).await.unwrap();
    a.driver.invalidate("orders", "1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(b.local.contains("orders", "1"));
}
