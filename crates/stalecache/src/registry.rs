//! Registry of named caches.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use stalecache_core::CacheKey;
use tracing::{debug, info};

use crate::cache::Cache;
use crate::metrics::CacheStats;

/// Type-erased view of a cache, as held by the [`Registry`].
#[async_trait]
pub trait NamedCache: Send + Sync {
    fn name(&self) -> &str;

    fn tags(&self) -> &[String];

    /// Clears the cache if any of `tags` is configured on it.
    /// Returns true if it was cleared.
    async fn invalidate_tags(&self, tags: &[String]) -> bool;

    async fn invalidate_all(&self);

    fn stats(&self) -> CacheStats;

    /// Allows downcasting back to the concrete [`Cache`].
    fn as_any(&self) -> &dyn Any;
}

#[async_trait]
impl<K, V> NamedCache for Cache<K, V>
where
    K: CacheKey + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        Cache::name(self)
    }

    fn tags(&self) -> &[String] {
        Cache::tags(self)
    }

    async fn invalidate_tags(&self, tags: &[String]) -> bool {
        Cache::invalidate_tags(self, tags).await
    }

    async fn invalidate_all(&self) {
        Cache::invalidate_all(self).await
    }

    fn stats(&self) -> CacheStats {
        Cache::stats(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Collection of caches addressed by name.
///
/// Routes tag and blanket invalidation to every registered cache.
/// Registering a second cache under an existing name replaces the first.
#[derive(Default)]
pub struct Registry {
    caches: RwLock<HashMap<String, Arc<dyn NamedCache>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Registers `cache` under its name.
    pub fn add<C: NamedCache + 'static>(&self, cache: C) -> &Self {
        let name = cache.name().to_string();
        let previous = self.caches.write().insert(name.clone(), Arc::new(cache));

        if previous.is_some() {
            info!(cache = %name, "Replaced registered cache");
        } else {
            debug!(cache = %name, "Registered cache");
        }
        self
    }

    /// Looks up a cache by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn NamedCache>> {
        self.caches.read().get(name).cloned()
    }

    /// Looks up a cache by name and key/value types.
    ///
    /// Returns `None` if the name is unknown or registered with other types.
    pub fn get_typed<K, V>(&self, name: &str) -> Option<Cache<K, V>>
    where
        K: CacheKey + Clone + Send + Sync + 'static,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.get(name)?
            .as_any()
            .downcast_ref::<Cache<K, V>>()
            .cloned()
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    /// Clears every cache tagged with any of `tags`.
    ///
    /// Returns how many caches were cleared.
    pub async fn invalidate_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        let tags: Vec<String> = tags.iter().map(|t| t.as_ref().to_string()).collect();

        let mut cleared = 0;
        for cache in self.snapshot() {
            if cache.invalidate_tags(&tags).await {
                cleared += 1;
            }
        }

        info!(tags = ?tags, cleared, "Invalidated caches by tag");
        cleared
    }

    /// Clears every registered cache.
    pub async fn invalidate_all(&self) {
        let caches = self.snapshot();
        for cache in &caches {
            cache.invalidate_all().await;
        }
        info!(caches = caches.len(), "Invalidated all caches");
    }

    // Drivers are async; never await while holding the map lock.
    fn snapshot(&self) -> Vec<Arc<dyn NamedCache>> {
        self.caches.read().values().cloned().collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("caches", &self.names())
            .finish()
    }
}
