//! Shared helpers for stalecache integration tests.

#![allow(dead_code, unused_imports)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use stalecache::{BoxError, CacheError, Driver, Fetcher, MemoryDriver, Result, StoredValue};

/// Fetcher returning `"<key>-v<n>"`, where `n` counts invocations.
pub struct CountingFetcher {
    calls: Arc<AtomicUsize>,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fetcher that succeeds after an optional delay.
    pub fn fetcher(&self, delay: Duration) -> Fetcher<String, String> {
        let calls = Arc::clone(&self.calls);
        Fetcher::new(move |key: String| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, BoxError>(format!("{}-v{}", key, n))
            }
        })
    }

    /// Fetcher that always fails.
    pub fn failing(&self) -> Fetcher<String, String> {
        let calls = Arc::clone(&self.calls);
        Fetcher::new(move |key: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err::<String, BoxError>(format!("origin has no {}", key).into()) }
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// In-memory driver that counts reads and can be told to reject writes.
pub struct CountingDriver {
    pub inner: MemoryDriver,
    gets: AtomicUsize,
    sets: AtomicUsize,
    fail_writes: AtomicBool,
}

impl CountingDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryDriver::with_defaults(),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        })
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Driver for CountingDriver {
    async fn get(&self, cache: &str, key: &str) -> Result<StoredValue> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(cache, key).await
    }

    async fn set(&self, cache: &str, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::driver("store is read-only"));
        }
        self.inner.set(cache, key, value, ttl).await
    }

    async fn invalidate(&self, cache: &str, key: &str) -> Result<()> {
        self.inner.invalidate(cache, key).await
    }

    async fn invalidate_all(&self, cache: &str) {
        self.inner.invalidate_all(cache).await
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Lets spawned background refreshes run to completion.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
