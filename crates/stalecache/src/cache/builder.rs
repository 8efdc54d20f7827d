//! Builder for cache engines.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use stalecache_core::{CacheError, CacheKey, Codec, Driver, Result};
use tracing::info;

use super::engine::Cache;
use crate::config::{CacheConfig, CacheConfigBuilder};
use crate::fetcher::Fetcher;
use crate::metrics::CacheMetrics;

/// Builder for [`Cache`].
///
/// A driver is required. Timing, tags and codec either come from a full
/// [`CacheConfig`] or from the individual setters.
pub struct CacheBuilder<K, V> {
    name: String,
    config: Option<CacheConfig>,
    settings: CacheConfigBuilder,
    driver: Option<Arc<dyn Driver>>,
    fetcher: Option<Fetcher<K, V>>,
    metrics: Option<CacheMetrics>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: CacheKey + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: None,
            settings: CacheConfig::builder(),
            driver: None,
            fetcher: None,
            metrics: None,
        }
    }

    /// Uses a complete configuration, overriding the individual setters.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn expire(mut self, expire: Duration) -> Self {
        self.settings = self.settings.expire(expire);
        self
    }

    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.settings = self.settings.lifetime(lifetime);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.settings = self.settings.tag(tag);
        self
    }

    pub fn codec(mut self, codec: Codec) -> Self {
        self.settings = self.settings.codec(codec);
        self
    }

    /// Sets the storage driver.
    pub fn driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Sets the fetcher used by [`Cache::get`].
    pub fn fetcher(mut self, fetcher: Fetcher<K, V>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Shares an existing statistics sink instead of creating one.
    pub fn metrics(mut self, metrics: CacheMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] if the name is empty, no driver
    /// was set or `expire` exceeds `lifetime`.
    pub fn build(self) -> Result<Cache<K, V>> {
        if self.name.is_empty() {
            return Err(CacheError::invalid_config("cache name must not be empty"));
        }

        let driver = self
            .driver
            .ok_or_else(|| CacheError::invalid_config(format!("cache '{}' has no driver", self.name)))?;

        let config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            },
            None => self.settings.build()?,
        };

        let metrics = self
            .metrics
            .unwrap_or_else(|| CacheMetrics::new(self.name.as_str()));

        info!(
            cache = %self.name,
            expire = ?config.expire(),
            lifetime = ?config.lifetime(),
            tags = ?config.tags(),
            driver = %driver.name(),
            "Cache created"
        );

        Ok(Cache::from_parts(self.name, config, driver, self.fetcher, metrics))
    }
}
