//! Statistics for cache engines.
//!
//! Every engine records its activity in a [`CacheMetrics`] sink. Counters are
//! kept in atomics for cheap snapshots and mirrored to the `metrics` facade,
//! so any installed recorder (Prometheus, statsd, ...) picks them up with a
//! `cache` label.

pub mod cache;

pub use cache::{CacheMetrics, CacheStats, register_cache_metrics};
