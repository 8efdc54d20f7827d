//! NATS bus.
//!
//! Connects peers running in different processes or hosts. Reconnection is
//! handled by `async-nats`; payloads published while disconnected may be
//! lost, which the propagation model tolerates.

use std::sync::Arc;

use async_nats::Client;
use async_trait::async_trait;
use futures::StreamExt;
use stalecache_core::{CacheError, Result};
use tracing::{debug, info};

use crate::bus::{Bus, PayloadStream};

/// Default subject for invalidation events
pub const DEFAULT_SUBJECT: &str = "stalecache.invalidations";

/// Bus bound to one NATS subject.
#[derive(Clone)]
pub struct NatsBus {
    client: Arc<Client>,
    subject: String,
}

impl NatsBus {
    /// Connects to a NATS server using the default subject.
    ///
    /// # Errors
    ///
    /// Returns an error if connection to the NATS server fails.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_subject(url, DEFAULT_SUBJECT).await
    }

    /// Connects to a NATS server using a custom subject.
    pub async fn connect_with_subject(url: &str, subject: &str) -> Result<Self> {
        info!("Connecting to NATS server at {}", url);

        let client = async_nats::connect(url).await.map_err(|e| {
            CacheError::driver(format!("failed to connect to NATS server at {}: {}", url, e))
        })?;

        info!("Connected to NATS server at {}", url);

        Ok(Self::from_client(client, subject))
    }

    /// Wraps an existing client.
    pub fn from_client(client: Client, subject: impl Into<String>) -> Self {
        Self {
            client: Arc::new(client),
            subject: subject.into(),
        }
    }
}

impl std::fmt::Debug for NatsBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsBus")
            .field("subject", &self.subject)
            .finish()
    }
}

#[async_trait]
impl Bus for NatsBus {
    async fn publish(&self, payload: Vec<u8>) -> Result<()> {
        self.client
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| CacheError::propagation(&self.subject, e.to_string()))?;

        debug!(subject = %self.subject, "Published payload to NATS");
        Ok(())
    }

    async fn subscribe(&self) -> Result<PayloadStream> {
        let subscriber = self
            .client
            .subscribe(self.subject.clone())
            .await
            .map_err(|e| {
                CacheError::driver(format!(
                    "failed to subscribe to NATS subject '{}': {}",
                    self.subject, e
                ))
            })?;

        Ok(Box::pin(subscriber.map(|msg| msg.payload.to_vec())))
    }

    fn subject(&self) -> &str {
        &self.subject
    }
}
