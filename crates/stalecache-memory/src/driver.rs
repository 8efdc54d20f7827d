//! Memory driver implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stalecache_core::{CacheError, Driver, Result, StoredValue};
use tracing::debug;

use crate::config::MemoryConfig;
use crate::gc::{GcHandle, GcScheduler};
use crate::store::Store;

/// In-process storage driver with absolute deadlines.
///
/// A single reader/writer lock guards the whole map: reads take the shared
/// side, writes the exclusive side. Payloads are copied in on `set` and out
/// on `get`, so callers never alias stored bytes.
///
/// The garbage collector runs for as long as the driver is alive and is
/// stopped when it is dropped.
pub struct MemoryDriver {
    /// Shared storage.
    store: Arc<Store>,
    /// The driver configuration.
    config: MemoryConfig,
    /// Collector handle, if collection is running.
    gc_handle: Option<GcHandle>,
}

impl MemoryDriver {
    /// Creates a new memory driver and starts its collector.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: MemoryConfig) -> Self {
        let store = Arc::new(Store::new());
        let gc_handle = GcScheduler::new(Arc::clone(&store), config.gc_interval).start();

        debug!(gc_interval = ?config.gc_interval, "Memory driver initialized");

        Self {
            store,
            config,
            gc_handle: Some(gc_handle),
        }
    }

    /// Creates a memory driver with the default GC interval.
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Stops the background collector.
    ///
    /// Expired items are still removed when read.
    pub fn stop_gc(&mut self) {
        if let Some(handle) = self.gc_handle.take() {
            handle.stop();
        }
    }

    /// Returns true while the background collector is running.
    pub fn gc_running(&self) -> bool {
        self.gc_handle.as_ref().is_some_and(|h| !h.is_stopped())
    }

    /// Runs one mark-and-sweep cycle now and returns how many items it removed.
    pub fn collect_garbage(&self) -> usize {
        self.store.collect()
    }

    /// Returns the number of stored items, expired or not, across all caches.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of stored items for one cache.
    pub fn cache_len(&self, cache: &str) -> usize {
        self.store.cache_len(cache)
    }

    /// Returns true if an item is physically present, even if expired.
    pub fn contains(&self, cache: &str, key: &str) -> bool {
        self.store.contains(cache, key)
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDriver")
            .field("gc_interval", &self.config.gc_interval)
            .field("items", &self.store.len())
            .finish()
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn get(&self, cache: &str, key: &str) -> Result<StoredValue> {
        self.store
            .get(cache, key)
            .ok_or_else(|| CacheError::not_found(cache, key))
    }

    async fn set(&self, cache: &str, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.store.set(cache, key, value, ttl);
        Ok(())
    }

    async fn invalidate(&self, cache: &str, key: &str) -> Result<()> {
        self.store.remove(cache, key);
        Ok(())
    }

    async fn invalidate_all(&self, cache: &str) {
        self.store.remove_all(cache);
    }

    fn name(&self) -> &str {
        "memory"
    }
}
