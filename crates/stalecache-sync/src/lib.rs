//! # Stalecache Sync
//!
//! Cross-process invalidation for stalecache drivers.
//!
//! [`Propagator`] wraps any [`Driver`](stalecache_core::Driver). Local
//! invalidations are applied to the wrapped driver and then broadcast to peer
//! processes over a [`Bus`]; invalidations received from peers are applied
//! locally. Cached values themselves are never replicated: every node keeps
//! its own copy and refetches on its own schedule.
//!
//! ## Consistency
//!
//! Propagation is eventual and best-effort. There is no acknowledgment,
//! ordering or retry. A node that misses an event keeps serving its copy
//! until its own staleness and TTL policy forces a refresh.
//!
//! ## Example
//!
//! ```ignore
//! use stalecache_sync::{BroadcastBus, Propagator};
//! use stalecache_memory::MemoryDriver;
//!
//! let bus = Arc::new(BroadcastBus::new("cache.invalidations"));
//! let driver = Propagator::start(Arc::new(MemoryDriver::with_defaults()), bus).await?;
//! ```

pub mod bus;
pub mod message;
#[cfg(feature = "nats")]
pub mod nats;
pub mod propagator;

// Re-exports
pub use bus::{BroadcastBus, Bus, PayloadStream};
pub use message::{Command, InvalidationMessage};
#[cfg(feature = "nats")]
pub use nats::NatsBus;
pub use propagator::{ListenerHandle, Propagator};
