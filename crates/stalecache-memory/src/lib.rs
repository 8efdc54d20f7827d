//! # Stalecache Memory Driver
//!
//! TTL-indexed in-process storage driver.
//!
//! Items live in a two-level map keyed by cache name then normalized key,
//! each with an absolute deadline. Expired items are removed lazily when read
//! and by a background mark-and-sweep collector running at a fixed period.
//!
//! ## Example
//!
//! ```ignore
//! use stalecache_memory::{MemoryConfig, MemoryDriver};
//! use stalecache_core::Driver;
//!
//! let driver = MemoryDriver::new(MemoryConfig::default());
//! driver.set("orders", "42", b"payload", Duration::from_secs(3)).await?;
//! let hit = driver.get("orders", "42").await?;
//! ```

pub mod config;
pub mod driver;
pub mod gc;
mod store;

// Re-exports
pub use config::MemoryConfig;
pub use driver::MemoryDriver;
pub use gc::GcHandle;
