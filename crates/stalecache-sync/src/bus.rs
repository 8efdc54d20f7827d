//! Publish/subscribe transport abstraction.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, stream};
use stalecache_core::Result;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Stream of raw payloads received on a subject.
pub type PayloadStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// A publish/subscribe connection bound to a single subject.
///
/// # Implementors
///
/// - [`BroadcastBus`] - in-process tokio broadcast channel
/// - `NatsBus` - NATS subject (feature `nats`)
#[async_trait]
pub trait Bus: Send + Sync {
    /// Publishes a payload to every subscriber of the subject.
    ///
    /// # Errors
    ///
    /// - `CacheError::Propagation` if the transport rejected the payload
    async fn publish(&self, payload: Vec<u8>) -> Result<()>;

    /// Opens a new subscription on the subject.
    ///
    /// Payloads published after this call returns are delivered to the stream.
    async fn subscribe(&self) -> Result<PayloadStream>;

    /// Returns the subject this bus is bound to.
    fn subject(&self) -> &str;
}

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 1024;

/// In-process bus backed by a tokio broadcast channel.
///
/// Clones share the same channel, so several propagators built from clones of
/// one `BroadcastBus` behave like nodes subscribed to the same subject. When a
/// subscriber falls more than `capacity` payloads behind, the oldest ones are
/// dropped for it.
#[derive(Clone)]
pub struct BroadcastBus {
    /// Broadcast sender for publishing payloads
    sender: Arc<broadcast::Sender<Vec<u8>>>,
    subject: String,
    capacity: usize,
}

impl BroadcastBus {
    /// Creates a bus with the default capacity (1024).
    pub fn new(subject: impl Into<String>) -> Self {
        Self::with_capacity(subject, DEFAULT_CAPACITY)
    }

    /// Creates a bus with a custom capacity.
    pub fn with_capacity(subject: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
            subject: subject.into(),
            capacity,
        }
    }

    /// Returns the current number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl std::fmt::Debug for BroadcastBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastBus")
            .field("subject", &self.subject)
            .field("capacity", &self.capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[async_trait]
impl Bus for BroadcastBus {
    async fn publish(&self, payload: Vec<u8>) -> Result<()> {
        match self.sender.send(payload) {
            Ok(count) => {
                debug!(subject = %self.subject, subscribers = count, "Published payload");
            },
            Err(_) => {
                debug!(subject = %self.subject, "Published payload but no subscribers");
            },
        }
        Ok(())
    }

    async fn subscribe(&self) -> Result<PayloadStream> {
        let receiver = self.sender.subscribe();
        let subject = self.subject.clone();

        let stream = stream::unfold(receiver, move |mut rx| {
            let subject = subject.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok(payload) => return Some((payload, rx)),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(subject = %subject, skipped = n, "Subscriber lagged, payloads dropped");
                            continue;
                        },
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(Box::pin(stream))
    }

    fn subject(&self) -> &str {
        &self.subject
    }
}
