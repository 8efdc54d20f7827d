//! Stalecache demo binary.
//!
//! Walks an `orders` cache through its lifecycle: slow first read, cached
//! read, stale read with background refresh, expiry, tag invalidation.
//!
//! Settings come from the TOML file given as first argument (or
//! `STALECACHE_CONFIG`) plus `STALECACHE__*` environment overrides.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use stalecache::settings::PropagationSettings;
use stalecache::{
    BroadcastBus, Bus, Cache, CacheConfig, Driver, Fetcher, MemoryDriver, Propagator, Registry,
    Settings,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Order {
    id: u64,
    customer: String,
    total_cents: u64,
}

/// Simulated database lookup.
async fn load_order(id: u64) -> anyhow::Result<Order> {
    info!(id, "==> Database hit");
    tokio::time::sleep(Duration::from_millis(500)).await;

    if id == 0 {
        anyhow::bail!("order {} does not exist", id);
    }

    info!(id, "<== Database response");
    Ok(Order {
        id,
        customer: format!("customer-{}", id % 7),
        total_cents: id * 1_250,
    })
}

fn load_settings() -> anyhow::Result<Settings> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("STALECACHE_CONFIG").ok());

    match path {
        Some(path) => Settings::load(&path).with_context(|| format!("loading settings from {}", path)),
        None => Settings::from_env().context("loading settings from environment"),
    }
}

#[cfg(feature = "nats")]
async fn connect_bus(settings: &PropagationSettings) -> anyhow::Result<Arc<dyn Bus>> {
    if let Some(url) = &settings.nats_url {
        let bus = stalecache::NatsBus::connect_with_subject(url, &settings.subject).await?;
        return Ok(Arc::new(bus));
    }
    Ok(Arc::new(BroadcastBus::new(settings.subject.as_str())))
}

#[cfg(not(feature = "nats"))]
async fn connect_bus(settings: &PropagationSettings) -> anyhow::Result<Arc<dyn Bus>> {
    if settings.nats_url.is_some() {
        warn!("Built without the `nats` feature, using in-process propagation");
    }
    Ok(Arc::new(BroadcastBus::new(settings.subject.as_str())))
}

fn orders_config(settings: &Settings) -> anyhow::Result<CacheConfig> {
    if let Some(config) = settings.cache("orders") {
        return Ok(config.clone());
    }

    let config = CacheConfig::builder()
        .expire(Duration::from_secs(1))
        .lifetime(Duration::from_secs(3))
        .tag("orders")
        .build()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    stalecache::metrics::register_cache_metrics();

    info!("Starting stalecache demo v{}", env!("CARGO_PKG_VERSION"));

    let settings = load_settings()?;
    let config = orders_config(&settings)?;

    let local: Arc<dyn Driver> = Arc::new(MemoryDriver::new(settings.memory.to_memory_config()));
    let bus = connect_bus(&settings.propagation).await?;
    let driver = Propagator::start(local, bus).await?;
    info!(instance_id = %driver.instance_id(), subject = %driver.subject(), "Driver ready");

    let orders: Cache<u64, Order> = Cache::builder("orders")
        .config(config.clone())
        .driver(Arc::new(driver))
        .fetcher(Fetcher::new(load_order))
        .build()?;

    let registry = Registry::global();
    registry.add(orders.clone());

    let orders = registry
        .get_typed::<u64, Order>("orders")
        .context("orders cache not registered")?;

    info!("First read is slow");
    let order = orders.get(&42).await?;
    info!(?order, "Read order");

    info!("Second read is served from cache");
    let order = orders.get(&42).await?;
    info!(?order, "Read order");

    info!("After expire, the stale value is served while refreshing in the background");
    tokio::time::sleep(config.expire() + Duration::from_millis(50)).await;
    let order = orders.get(&42).await?;
    info!(?order, "Read order");
    tokio::time::sleep(Duration::from_millis(600)).await;

    info!("After lifetime, the value is fetched again");
    tokio::time::sleep(config.lifetime() + Duration::from_millis(50)).await;
    let order = orders.get(&42).await?;
    info!(?order, "Read order");

    info!("Unknown orders surface an error");
    if let Err(e) = orders.get(&0).await {
        warn!(error = %e, "Read failed");
    }

    let cleared = registry.invalidate_tags(&["orders"]).await;
    info!(cleared, "Invalidated by tag");

    let stats = orders.stats();
    info!(
        gets = stats.gets,
        hits = stats.hits,
        stale_hits = stats.stale_hits,
        misses = stats.misses,
        fetches = stats.fetches,
        hit_rate = stats.hit_rate(),
        "Cache statistics"
    );

    Ok(())
}
