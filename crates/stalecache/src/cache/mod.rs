//! Cache engine.
//!
//! A [`Cache`] serves values from a storage driver, refreshing them from
//! their origin through a [`Fetcher`](crate::Fetcher):
//!
//! - **fresh** items are returned as is;
//! - **stale** items (remaining TTL below `lifetime - expire`) are returned
//!   and refreshed in a background task;
//! - **missing** items are fetched synchronously, then read again.

mod builder;
mod engine;

pub use builder::CacheBuilder;
pub use engine::Cache;
