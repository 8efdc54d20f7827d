//! Error types for stalecache.
//!
//! Every fallible operation in the workspace returns [`CacheError`]. Some
//! variants never reach a caller of the cache engine: a store miss only
//! drives a fetch, and fetch or encode failures inside a refresh are logged
//! and absorbed. They still exist as values so drivers and the engine can
//! talk about them.
//!
//! # Example
//!
//! ```
//! use stalecache_core::CacheError;
//!
//! let miss = CacheError::not_found("orders", "42");
//! assert!(miss.is_not_found());
//! assert_eq!(miss.to_string(), "item not found: orders/42");
//! ```

use thiserror::Error;

/// Boxed error returned by fetchers and transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used across the stalecache crates.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur when reading, refreshing or invalidating a cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key is absent from the store or its deadline has passed.
    #[error("item not found: {cache}/{key}")]
    NotFound {
        /// Cache name the lookup was made against
        cache: String,
        /// Normalized key
        key: String,
    },

    /// The origin fetcher returned an error.
    #[error("fetch failed for {cache}/{key}: {source}")]
    Fetch {
        /// Cache name
        cache: String,
        /// Normalized key
        key: String,
        /// Error reported by the fetcher
        #[source]
        source: BoxError,
    },

    /// A value could not be encoded into a payload.
    #[error("{codec} encode error: {message}")]
    Serialize {
        /// Codec that failed
        codec: &'static str,
        /// Description of the failure
        message: String,
    },

    /// A stored payload could not be decoded into the requested type.
    #[error("{codec} decode error: {message}")]
    Deserialize {
        /// Codec that failed
        codec: &'static str,
        /// Description of the failure
        message: String,
    },

    /// An invalidation event could not be published to peers.
    #[error("cannot publish invalidation on '{subject}': {message}")]
    Propagation {
        /// Subject the event was published on
        subject: String,
        /// Description of the transport failure
        message: String,
    },

    /// Both read attempts failed: the store still had nothing after a fetch.
    #[error("cannot get data from cache '{cache}' on second attempt")]
    Exhausted {
        /// Cache name
        cache: String,
        /// Normalized key
        key: String,
        /// Error returned by the store on the second read
        #[source]
        source: Box<CacheError>,
    },

    /// `get` was called on a cache that has no configured fetcher.
    #[error("cache '{0}' has no fetcher configured; use get_with")]
    MissingFetcher(String),

    /// The cache or driver configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A storage backend failed for a reason other than a miss.
    #[error("driver error: {0}")]
    Driver(String),
}

impl CacheError {
    /// Creates a new not-found error.
    pub fn not_found(cache: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            cache: cache.into(),
            key: key.into(),
        }
    }

    /// Creates a new fetch error.
    pub fn fetch(cache: impl Into<String>, key: impl Into<String>, source: BoxError) -> Self {
        Self::Fetch {
            cache: cache.into(),
            key: key.into(),
            source,
        }
    }

    /// Creates a new propagation error.
    pub fn propagation(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Propagation {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Wraps the error of the second store read.
    pub fn exhausted(cache: impl Into<String>, key: impl Into<String>, source: CacheError) -> Self {
        Self::Exhausted {
            cache: cache.into(),
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Creates a new driver error.
    pub fn driver(msg: impl Into<String>) -> Self {
        Self::Driver(msg.into())
    }

    /// Creates a new invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Returns true if this error is a store miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if a later attempt might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Fetch { .. }
                | Self::Propagation { .. }
                | Self::Exhausted { .. }
                | Self::Driver(_)
        )
    }
}
