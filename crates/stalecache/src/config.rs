//! Per-cache configuration.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use stalecache_core::{CacheError, Codec, Result};

/// Configuration for one cache engine.
///
/// Items are written with a TTL of `lifetime`. Once an item has been stored
/// for longer than `expire` it is stale: still served, but refreshed in the
/// background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Age after which an item is refreshed in the background.
    #[serde(default = "default_expire", with = "humantime_serde")]
    expire: Duration,

    /// TTL handed to the driver on every write.
    #[serde(default = "default_lifetime", with = "humantime_serde")]
    lifetime: Duration,

    /// Tags used for group invalidation.
    #[serde(default)]
    tags: Vec<String>,

    /// Payload encoding.
    #[serde(default)]
    codec: Codec,
}

fn default_expire() -> Duration {
    Duration::from_secs(60)
}

fn default_lifetime() -> Duration {
    Duration::from_secs(300)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expire: default_expire(),
            lifetime: default_lifetime(),
            tags: Vec::new(),
            codec: Codec::default(),
        }
    }
}

impl CacheConfig {
    /// Creates a new builder for CacheConfig.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    pub fn expire(&self) -> Duration {
        self.expire
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Remaining TTL below which a stored item counts as stale.
    pub fn threshold(&self) -> Duration {
        self.lifetime.saturating_sub(self.expire)
    }

    /// Returns true if any of `tags` is configured on this cache.
    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter()
            .any(|t| self.tags.iter().any(|own| own == t.as_ref()))
    }

    /// Checks the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] if `expire` exceeds `lifetime`,
    /// `lifetime` is zero, or `lifetime` is too large to compute a deadline.
    pub fn validate(&self) -> Result<()> {
        if self.lifetime.is_zero() {
            return Err(CacheError::invalid_config("lifetime must be greater than zero"));
        }
        if Instant::now().checked_add(self.lifetime).is_none() {
            return Err(CacheError::invalid_config(format!(
                "lifetime ({:?}) is out of range",
                self.lifetime
            )));
        }
        if self.expire > self.lifetime {
            return Err(CacheError::invalid_config(format!(
                "expire ({:?}) must not exceed lifetime ({:?})",
                self.expire, self.lifetime
            )));
        }
        Ok(())
    }
}

/// Builder for CacheConfig.
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    expire: Option<Duration>,
    lifetime: Option<Duration>,
    tags: Vec<String>,
    codec: Codec,
}

impl CacheConfigBuilder {
    pub fn expire(mut self, expire: Duration) -> Self {
        self.expire = Some(expire);
        self
    }

    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// Adds a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the tags.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `expire` exceeds `lifetime`.
    pub fn build(self) -> Result<CacheConfig> {
        let config = CacheConfig {
            expire: self.expire.unwrap_or_else(default_expire),
            lifetime: self.lifetime.unwrap_or_else(default_lifetime),
            tags: self.tags,
            codec: self.codec,
        };
        config.validate()?;
        Ok(config)
    }
}
