//! # Stalecache
//!
//! Stale-while-revalidate caching facade.
//!
//! A [`Cache`] sits in front of an expensive origin (database, remote API)
//! and serves values from a pluggable storage [`Driver`]:
//!
//! - values older than `expire` are served while being refreshed in the
//!   background;
//! - at most one refresh runs per cache, concurrent callers wait for it;
//! - caches carry tags, and a [`Registry`] clears every cache sharing a tag;
//! - a [`Propagator`] broadcasts invalidations to peer processes.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use stalecache::{Cache, Fetcher, MemoryDriver, Registry};
//!
//! # async fn run() -> stalecache::Result<()> {
//! let driver = Arc::new(MemoryDriver::with_defaults());
//!
//! let orders: Cache<u64, String> = Cache::builder("orders")
//!     .expire(Duration::from_secs(1))
//!     .lifetime(Duration::from_secs(3))
//!     .tag("orders")
//!     .driver(driver)
//!     .fetcher(Fetcher::new(|id| async move {
//!         Ok::<_, std::io::Error>(format!("order {}", id))
//!     }))
//!     .build()?;
//!
//! let registry = Registry::new();
//! registry.add(orders.clone());
//!
//! assert_eq!(orders.get(&42).await?, "order 42");
//! registry.invalidate_tags(&["orders"]).await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod fetcher;
pub mod metrics;
pub mod registry;
pub mod settings;

pub use cache::{Cache, CacheBuilder};
pub use config::{CacheConfig, CacheConfigBuilder};
pub use fetcher::Fetcher;
pub use metrics::{CacheMetrics, CacheStats};
pub use registry::{NamedCache, Registry};
pub use settings::{Settings, SettingsError};

// Re-exports
pub use stalecache_core::{
    BoxError, CacheError, CacheKey, Codec, DebugKey, DisplayKey, Driver, Result, Serializer,
    StoredValue, impl_display_key,
};
pub use stalecache_memory::{MemoryConfig, MemoryDriver};
#[cfg(feature = "nats")]
pub use stalecache_sync::NatsBus;
pub use stalecache_sync::{BroadcastBus, Bus, InvalidationMessage, Propagator};
