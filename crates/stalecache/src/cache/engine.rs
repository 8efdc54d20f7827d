//! Read-through cache engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::Serialize;
use serde::de::DeserializeOwned;
use stalecache_core::{CacheError, CacheKey, Driver, Result};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::builder::CacheBuilder;
use crate::config::CacheConfig;
use crate::fetcher::Fetcher;
use crate::metrics::{CacheMetrics, CacheStats};

/// Named read-through cache with stale-while-revalidate semantics.
///
/// Values are stored through a [`Driver`] with a TTL of `lifetime`. A read
/// that finds an item older than `expire` returns it immediately and
/// refreshes it in the background. A read that finds nothing fetches from
/// origin synchronously and reads again.
///
/// At most one refresh runs per engine at a time. Callers that need a
/// refresh while another one is in flight wait for it instead of hitting the
/// origin again.
///
/// Cloning is cheap: clones share configuration, driver and refresh state.
pub struct Cache<K, V> {
    inner: Arc<Inner<K, V>>,
}

struct Inner<K, V> {
    name: String,
    config: CacheConfig,
    driver: Arc<dyn Driver>,
    fetcher: Option<Fetcher<K, V>>,
    /// Set while a refresh holds `fetch_lock` exclusively.
    updating: AtomicBool,
    fetch_lock: RwLock<()>,
    metrics: CacheMetrics,
}

/// Clears the in-flight flag when the refresh ends, including when the
/// refresh future is dropped mid-way.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.inner.name)
            .field("config", &self.inner.config)
            .field("driver", &self.inner.driver.name())
            .field("has_fetcher", &self.inner.fetcher.is_some())
            .finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: CacheKey + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Creates a new builder for a cache called `name`.
    pub fn builder(name: impl Into<String>) -> CacheBuilder<K, V> {
        CacheBuilder::new(name)
    }

    pub(crate) fn from_parts(
        name: String,
        config: CacheConfig,
        driver: Arc<dyn Driver>,
        fetcher: Option<Fetcher<K, V>>,
        metrics: CacheMetrics,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                config,
                driver,
                fetcher,
                updating: AtomicBool::new(false),
                fetch_lock: RwLock::new(()),
                metrics,
            }),
        }
    }

    /// Returns the cache name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn tags(&self) -> &[String] {
        self.inner.config.tags()
    }

    /// Returns the statistics sink.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.inner.metrics
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.metrics.snapshot()
    }

    /// Returns true while a refresh is running.
    pub fn is_refreshing(&self) -> bool {
        self.inner.updating.load(Ordering::Acquire)
    }

    /// Reads `key` using the fetcher configured on the builder.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::MissingFetcher`] if the cache was built without
    /// a fetcher; otherwise see [`Cache::get_with`].
    pub async fn get(&self, key: &K) -> Result<V> {
        match &self.inner.fetcher {
            Some(fetcher) => self.get_with(key, fetcher).await,
            None => Err(CacheError::MissingFetcher(self.inner.name.clone())),
        }
    }

    /// Reads `key`, loading it through `fetcher` when it is not stored.
    ///
    /// # Errors
    ///
    /// - [`CacheError::Deserialize`] if the stored payload cannot be decoded.
    /// - [`CacheError::Exhausted`] if the value is still missing after a
    ///   synchronous refresh. The driver's error is the source.
    pub async fn get_with(&self, key: &K, fetcher: &Fetcher<K, V>) -> Result<V> {
        let inner = &self.inner;
        let key_str = key.cache_key();
        inner.metrics.record_get();

        let mut attempt = 0;
        loop {
            attempt += 1;

            match inner.driver.get(&inner.name, &key_str).await {
                Ok(stored) => {
                    inner.metrics.record_hit();
                    let decoded = inner.config.codec().deserialize::<V>(&stored.value);

                    if stored.ttl < inner.config.threshold() {
                        inner.metrics.record_stale_hit();
                        debug!(
                            cache = %inner.name,
                            key = %key_str,
                            ttl_ms = stored.ttl.as_millis() as u64,
                            "Serving stale value, refreshing in background"
                        );
                        self.spawn_refresh(key.clone(), key_str.clone(), fetcher.clone());
                    }

                    return decoded;
                },
                Err(e) if attempt >= 2 => {
                    inner.metrics.record_exhausted();
                    warn!(cache = %inner.name, key = %key_str, error = %e, "Value unavailable after refresh");
                    return Err(CacheError::exhausted(&inner.name, key_str, e));
                },
                Err(e) => {
                    inner.metrics.record_miss();
                    debug!(cache = %inner.name, key = %key_str, reason = %e, "Cache miss, fetching");
                    self.fetch(key.clone(), &key_str, fetcher).await;
                },
            }
        }
    }

    /// Removes `key` from the store.
    pub async fn invalidate(&self, key: &K) -> Result<()> {
        let key_str = key.cache_key();
        self.inner.metrics.record_invalidation("key");
        debug!(cache = %self.inner.name, key = %key_str, "Invalidating key");
        self.inner.driver.invalidate(&self.inner.name, &key_str).await
    }

    /// Drops every item if any of `tags` is configured on this cache.
    ///
    /// Returns true if the cache was cleared.
    pub async fn invalidate_tags<S: AsRef<str> + Sync>(&self, tags: &[S]) -> bool {
        if !self.inner.config.has_any_tag(tags) {
            return false;
        }
        self.inner.metrics.record_invalidation("tags");
        self.clear().await;
        true
    }

    /// Drops every item of this cache.
    pub async fn invalidate_all(&self) {
        self.inner.metrics.record_invalidation("all");
        self.clear().await;
    }

    async fn clear(&self) {
        debug!(cache = %self.inner.name, "Invalidating all items");
        self.inner.driver.invalidate_all(&self.inner.name).await;
    }

    fn spawn_refresh(&self, key: K, key_str: String, fetcher: Fetcher<K, V>) {
        let cache = self.clone();
        tokio::spawn(async move {
            cache.fetch(key, &key_str, &fetcher).await;
        });
    }

    /// Single-flight refresh of one key.
    ///
    /// The caller that claims the in-flight flag runs the refresh under the
    /// exclusive side of `fetch_lock`; everyone else waits on the shared side
    /// and returns without fetching. Failures are logged and counted only.
    async fn fetch(&self, key: K, key_str: &str, fetcher: &Fetcher<K, V>) {
        let inner = &self.inner;

        if inner
            .updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            inner.metrics.record_fetch_wait();
            debug!(cache = %inner.name, key = %key_str, "Refresh in flight, waiting");
            let _ = inner.fetch_lock.read().await;
            return;
        }

        let in_flight = InFlight(&inner.updating);
        let guard = inner.fetch_lock.write().await;
        self.refresh(key, key_str, fetcher).await;
        drop(guard);
        drop(in_flight);
    }

    async fn refresh(&self, key: K, key_str: &str, fetcher: &Fetcher<K, V>) {
        let inner = &self.inner;
        let started = Instant::now();

        let value = match fetcher.fetch(key).await {
            Ok(value) => value,
            Err(e) => {
                inner.metrics.record_fetch_error();
                let e = CacheError::fetch(&inner.name, key_str, e);
                warn!(cache = %inner.name, key = %key_str, error = %e, "Fetcher failed");
                return;
            },
        };
        inner.metrics.record_fetch(started.elapsed());

        let bytes = match inner.config.codec().serialize(&value) {
            Ok(bytes) => bytes,
            Err(e) => {
                inner.metrics.record_encode_error();
                warn!(cache = %inner.name, key = %key_str, error = %e, "Failed to encode fetched value");
                return;
            },
        };

        match inner
            .driver
            .set(&inner.name, key_str, &bytes, inner.config.lifetime())
            .await
        {
            Ok(()) => debug!(cache = %inner.name, key = %key_str, bytes = bytes.len(), "Stored fetched value"),
            Err(e) => {
                inner.metrics.record_write_error();
                warn!(cache = %inner.name, key = %key_str, error = %e, "Failed to store fetched value");
            },
        }
    }
}
