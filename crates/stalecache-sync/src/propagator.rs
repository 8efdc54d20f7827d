//! Invalidation propagator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use stalecache_core::{Driver, Result, StoredValue};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bus::{Bus, PayloadStream};
use crate::message::{Command, InvalidationMessage};

/// Handle for the inbound listener task.
///
/// The listener stops when the handle is dropped.
#[derive(Debug)]
pub struct ListenerHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl ListenerHandle {
    /// Signals the listener to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Driver decorator that distributes invalidations to peer processes.
///
/// - `invalidate` and `invalidate_all` apply locally first, then publish.
/// - `get` and `set` pass straight through to the wrapped driver.
/// - Inbound events from other instances are applied to the wrapped driver
///   and never re-published, so each event travels a single hop.
pub struct Propagator {
    inner: Arc<dyn Driver>,
    bus: Arc<dyn Bus>,
    instance_id: String,
    listener: ListenerHandle,
}

impl Propagator {
    /// Subscribes to the bus and starts applying inbound invalidations.
    ///
    /// The subscription is in place when this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus subscription fails.
    pub async fn start(inner: Arc<dyn Driver>, bus: Arc<dyn Bus>) -> Result<Self> {
        let instance_id = Uuid::new_v4().to_string();
        let stream = bus.subscribe().await?;

        let listener = Listener {
            inner: Arc::clone(&inner),
            instance_id: instance_id.clone(),
        }
        .start(stream);

        info!(
            instance_id = %instance_id,
            subject = %bus.subject(),
            driver = %inner.name(),
            "Invalidation propagator started"
        );

        Ok(Self {
            inner,
            bus,
            instance_id,
            listener,
        })
    }

    /// Returns the random id identifying this instance on the bus.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Returns the subject invalidations are published on.
    pub fn subject(&self) -> &str {
        self.bus.subject()
    }

    /// Stops applying inbound invalidations.
    ///
    /// Local invalidations are still published.
    pub fn stop_listening(&self) {
        self.listener.stop();
    }

    async fn publish(&self, msg: &InvalidationMessage) -> Result<()> {
        let payload = msg.encode()?;
        self.bus.publish(payload).await
    }
}

impl std::fmt::Debug for Propagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Propagator")
            .field("instance_id", &self.instance_id)
            .field("subject", &self.bus.subject())
            .field("inner", &self.inner.name())
            .finish()
    }
}

#[async_trait]
impl Driver for Propagator {
    async fn get(&self, cache: &str, key: &str) -> Result<StoredValue> {
        self.inner.get(cache, key).await
    }

    async fn set(&self, cache: &str, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.inner.set(cache, key, value, ttl).await
    }

    /// Invalidates locally, then publishes.
    ///
    /// A publish failure is returned, but the local invalidation stays.
    async fn invalidate(&self, cache: &str, key: &str) -> Result<()> {
        self.inner.invalidate(cache, key).await?;

        let msg = InvalidationMessage::invalidate(&self.instance_id, cache, key);
        self.publish(&msg).await.inspect_err(|e| {
            warn!(cache = %cache, key = %key, error = %e, "Failed to publish invalidation");
        })
    }

    /// Invalidates locally, then publishes. Publish failures are only logged.
    async fn invalidate_all(&self, cache: &str) {
        self.inner.invalidate_all(cache).await;

        let msg = InvalidationMessage::invalidate_all(&self.instance_id, cache);
        if let Err(e) = self.publish(&msg).await {
            warn!(cache = %cache, error = %e, "Failed to publish invalidate-all");
        }
    }

    fn name(&self) -> &str {
        "propagator"
    }
}

/// Applies inbound invalidations to the local driver.
struct Listener {
    inner: Arc<dyn Driver>,
    instance_id: String,
}

impl Listener {
    fn start(self, stream: PayloadStream) -> ListenerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(self.run(stream, shutdown_rx));

        ListenerHandle { shutdown_tx }
    }

    async fn run(self, mut stream: PayloadStream, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                next = stream.next() => match next {
                    Some(payload) => self.handle(&payload).await,
                    None => {
                        info!("Invalidation stream closed");
                        break;
                    },
                },
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        debug!(instance_id = %self.instance_id, "Invalidation listener shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn handle(&self, payload: &[u8]) {
        let msg = match InvalidationMessage::decode(payload) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Discarding undecodable invalidation message");
                return;
            },
        };

        // Skip its own messages
        if msg.sender == self.instance_id {
            return;
        }

        match (msg.command, msg.key) {
            (Command::Invalidate, Some(key)) => {
                debug!(cache = %msg.cache_name, key = %key, sender = %msg.sender, "Applying remote invalidation");
                if let Err(e) = self.inner.invalidate(&msg.cache_name, &key).await {
                    warn!(cache = %msg.cache_name, key = %key, error = %e, "Remote invalidation failed");
                }
            },
            (Command::Invalidate, None) => {
                warn!(cache = %msg.cache_name, sender = %msg.sender, "Invalidate message without key");
            },
            (Command::InvalidateAll, _) => {
                debug!(cache = %msg.cache_name, sender = %msg.sender, "Applying remote invalidate-all");
                self.inner.invalidate_all(&msg.cache_name).await;
            },
            (Command::Unknown, _) => {
                debug!(sender = %msg.sender, "Ignoring unknown invalidation command");
            },
        }
    }
}
