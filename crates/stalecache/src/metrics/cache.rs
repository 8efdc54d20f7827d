//! Cache metrics recording.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Describes the cache metrics to the installed recorder.
/// Call once at startup.
pub fn register_cache_metrics() {
    metrics::describe_counter!("stalecache_gets_total", "Total number of cache reads");
    metrics::describe_counter!("stalecache_hits_total", "Reads served from the store");
    metrics::describe_counter!(
        "stalecache_stale_hits_total",
        "Reads served stale that triggered a background refresh"
    );
    metrics::describe_counter!("stalecache_misses_total", "Store misses");
    metrics::describe_counter!("stalecache_fetches_total", "Successful refreshes from origin");
    metrics::describe_counter!(
        "stalecache_fetch_waits_total",
        "Refresh requests that waited on an in-flight refresh"
    );
    metrics::describe_counter!(
        "stalecache_fetch_errors_total",
        "Refreshes aborted, labeled by stage"
    );
    metrics::describe_counter!(
        "stalecache_exhausted_total",
        "Reads that failed after the second attempt"
    );
    metrics::describe_counter!(
        "stalecache_invalidations_total",
        "Invalidations, labeled by kind"
    );
    metrics::describe_histogram!(
        "stalecache_fetch_seconds",
        "Time spent in origin fetchers"
    );
}

#[derive(Debug, Default)]
struct Counters {
    gets: AtomicU64,
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    fetch_waits: AtomicU64,
    fetch_errors: AtomicU64,
    encode_errors: AtomicU64,
    write_errors: AtomicU64,
    exhausted: AtomicU64,
    invalidations: AtomicU64,
}

/// Point-in-time copy of a cache's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub gets: u64,
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub fetch_waits: u64,
    pub fetch_errors: u64,
    pub encode_errors: u64,
    pub write_errors: u64,
    pub exhausted: u64,
    pub invalidations: u64,
}

impl CacheStats {
    /// Fraction of reads served from the store.
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            self.hits as f64 / self.gets as f64
        }
    }
}

/// Statistics sink for one cache.
///
/// Cloning shares the counters.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    cache: Arc<str>,
    counters: Arc<Counters>,
}

impl CacheMetrics {
    pub fn new(cache: impl Into<Arc<str>>) -> Self {
        Self {
            cache: cache.into(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Returns the cache name used as label.
    pub fn cache(&self) -> &str {
        &self.cache
    }

    fn label(&self) -> String {
        self.cache.to_string()
    }

    /// Registra una lectura
    pub fn record_get(&self) {
        self.counters.gets.fetch_add(1, Ordering::Relaxed);
        counter!("stalecache_gets_total", "cache" => self.label()).increment(1);
    }

    pub fn record_hit(&self) {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        counter!("stalecache_hits_total", "cache" => self.label()).increment(1);
    }

    pub fn record_stale_hit(&self) {
        self.counters.stale_hits.fetch_add(1, Ordering::Relaxed);
        counter!("stalecache_stale_hits_total", "cache" => self.label()).increment(1);
    }

    pub fn record_miss(&self) {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        counter!("stalecache_misses_total", "cache" => self.label()).increment(1);
    }

    /// Records a completed refresh and how long the fetcher took.
    pub fn record_fetch(&self, duration: Duration) {
        self.counters.fetches.fetch_add(1, Ordering::Relaxed);
        counter!("stalecache_fetches_total", "cache" => self.label()).increment(1);
        histogram!("stalecache_fetch_seconds", "cache" => self.label())
            .record(duration.as_secs_f64());
    }

    pub fn record_fetch_wait(&self) {
        self.counters.fetch_waits.fetch_add(1, Ordering::Relaxed);
        counter!("stalecache_fetch_waits_total", "cache" => self.label()).increment(1);
    }

    pub fn record_fetch_error(&self) {
        self.counters.fetch_errors.fetch_add(1, Ordering::Relaxed);
        self.record_refresh_abort("fetch");
    }

    pub fn record_encode_error(&self) {
        self.counters.encode_errors.fetch_add(1, Ordering::Relaxed);
        self.record_refresh_abort("encode");
    }

    pub fn record_write_error(&self) {
        self.counters.write_errors.fetch_add(1, Ordering::Relaxed);
        self.record_refresh_abort("write");
    }

    fn record_refresh_abort(&self, stage: &'static str) {
        counter!(
            "stalecache_fetch_errors_total",
            "cache" => self.label(),
            "stage" => stage
        )
        .increment(1);
    }

    pub fn record_exhausted(&self) {
        self.counters.exhausted.fetch_add(1, Ordering::Relaxed);
        counter!("stalecache_exhausted_total", "cache" => self.label()).increment(1);
    }

    /// Records an invalidation of the given kind (`key`, `tags`, `all`).
    pub fn record_invalidation(&self, kind: &'static str) {
        self.counters.invalidations.fetch_add(1, Ordering::Relaxed);
        counter!(
            "stalecache_invalidations_total",
            "cache" => self.label(),
            "kind" => kind
        )
        .increment(1);
    }

    /// Helper para medir tiempo de operacion
    pub fn time<T, F: FnOnce() -> T>(f: F) -> (T, Duration) {
        let start = Instant::now();
        let result = f();
        (result, start.elapsed())
    }

    /// Returns a snapshot of every counter.
    pub fn snapshot(&self) -> CacheStats {
        let c = &self.counters;
        CacheStats {
            gets: c.gets.load(Ordering::Relaxed),
            hits: c.hits.load(Ordering::Relaxed),
            stale_hits: c.stale_hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            fetches: c.fetches.load(Ordering::Relaxed),
            fetch_waits: c.fetch_waits.load(Ordering::Relaxed),
            fetch_errors: c.fetch_errors.load(Ordering::Relaxed),
            encode_errors: c.encode_errors.load(Ordering::Relaxed),
            write_errors: c.write_errors.load(Ordering::Relaxed),
            exhausted: c.exhausted.load(Ordering::Relaxed),
            invalidations: c.invalidations.load(Ordering::Relaxed),
        }
    }
}
