//! # Stalecache Core
//!
//! Contracts shared by every stalecache crate.
//!
//! This crate defines the storage [`Driver`] abstraction the cache engine
//! talks to, the [`CacheKey`] normalization traits that turn arbitrary keys
//! into the string form drivers store, the [`Serializer`] codecs that turn
//! values into opaque byte payloads, and the [`CacheError`] taxonomy.
//!
//! ## Example
//!
//! ```
//! use stalecache_core::{CacheKey, Codec, Serializer};
//!
//! assert_eq!("orders:42".cache_key(), "orders:42");
//! assert_eq!(42u64.cache_key(), "42");
//!
//! let bytes = Codec::Json.serialize(&vec![1, 2, 3]).unwrap();
//! let back: Vec<i32> = Codec::Json.deserialize(&bytes).unwrap();
//! assert_eq!(back, vec![1, 2, 3]);
//! ```

pub mod driver;
pub mod error;
pub mod key;
pub mod serializer;

// Re-exports
pub use driver::{Driver, StoredValue};
pub use error::{BoxError, CacheError, Result};
pub use key::{CacheKey, DebugKey, DisplayKey};
pub use serializer::{Codec, JsonSerializer, MessagePackSerializer, Serializer};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
