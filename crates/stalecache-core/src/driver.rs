//! Storage driver trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// A payload returned by a driver on a hit, with its remaining time to live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    /// Opaque encoded payload.
    pub value: Vec<u8>,
    /// Time left before the item expires.
    pub ttl: Duration,
}

impl StoredValue {
    /// Creates a new stored value.
    pub fn new(value: Vec<u8>, ttl: Duration) -> Self {
        Self { value, ttl }
    }
}

/// A byte-oriented storage backend addressed by `(cache name, key)`.
///
/// Keys arrive already normalized (see [`crate::CacheKey`]). Values are opaque
/// payloads produced by a [`crate::Serializer`].
///
/// # Implementors
///
/// - `MemoryDriver` - TTL-indexed in-process store
/// - `Propagator` - decorator broadcasting invalidations to peer processes
///
/// # Example
///
/// ```ignore
/// use stalecache_core::{Driver, StoredValue, Result};
///
/// struct NullDriver;
///
/// #[async_trait]
/// impl Driver for NullDriver {
///     async fn get(&self, cache: &str, key: &str) -> Result<StoredValue> {
///         Err(CacheError::not_found(cache, key))
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait Driver: Send + Sync {
    /// Loads a key if it exists and is not outdated.
    ///
    /// # Errors
    ///
    /// - `CacheError::NotFound` if the key is absent or expired
    /// - `CacheError::Driver` if the backend failed
    async fn get(&self, cache: &str, key: &str) -> Result<StoredValue>;

    /// Stores a payload, replacing any previous one, for `ttl`.
    async fn set(&self, cache: &str, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Removes a single key.
    async fn invalidate(&self, cache: &str, key: &str) -> Result<()>;

    /// Removes every key of a cache.
    async fn invalidate_all(&self, cache: &str);

    /// Returns the name of this driver.
    ///
    /// This is used for logging and identification purposes.
    fn name(&self) -> &str {
        "driver"
    }
}
