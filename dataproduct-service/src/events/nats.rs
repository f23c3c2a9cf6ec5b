//! NATS JetStream publisher
//!
//! Events are published to JetStream with the idempotency key in the
//! `Nats-Msg-Id` header. The stream's duplicate window drops a second publish
//! with the same id and reports it back through `PublishAck::duplicate`.

use std::time::Duration;

use async_nats::{jetstream, Client, HeaderMap};
use async_trait::async_trait;

use super::{DomainEvent, EventPublisher, PublishOutcome};
use crate::config::EventsConfig;
use crate::error::{Error, Result};

const MSG_ID_HEADER: &str = "Nats-Msg-Id";
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// [`EventPublisher`] backed by a JetStream context
#[derive(Clone)]
pub struct NatsEventPublisher {
    jetstream: jetstream::Context,
}

impl NatsEventPublisher {
    /// Wrap an already connected client
    pub fn new(client: Client) -> Self {
        Self {
            jetstream: jetstream::new(client),
        }
    }

    /// Connect using `config.nats_url`, retrying with exponential backoff
    pub async fn connect(config: &EventsConfig, client_name: &str) -> Result<Self> {
        let client = create_client_with_retries(config, client_name).await?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl EventPublisher for NatsEventPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<PublishOutcome> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| Error::Internal(format!("Failed to serialize event: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(MSG_ID_HEADER, event.key.as_str());

        let ack = self
            .jetstream
            .publish_with_headers(event.subject.clone(), headers, payload.into())
            .await
            .map_err(|e| Error::Messaging(format!("Failed to publish to {}: {}", event.subject, e)))?
            .await
            .map_err(|e| {
                Error::Messaging(format!("No acknowledgement for {}: {}", event.subject, e))
            })?;

        if ack.duplicate {
            tracing::debug!(key = %event.key, stream = %ack.stream, "duplicate event dropped by stream");
            return Ok(PublishOutcome::Duplicate);
        }
        Ok(PublishOutcome::Enqueued)
    }
}

async fn create_client_with_retries(config: &EventsConfig, client_name: &str) -> Result<Client> {
    let url = config
        .nats_url
        .as_deref()
        .ok_or_else(|| Error::Internal("events.nats_url is not set".to_string()))?;

    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_client(url, client_name, config.max_reconnects).await {
            Ok(client) => {
                if attempt > 0 {
                    tracing::info!(
                        "NATS connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!("NATS client connected to {}", url);
                }
                return Ok(client);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to NATS after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = retry_delay(base_delay, attempt);
                tracing::warn!(
                    "NATS connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// `base * 2^(attempt - 1)`, capped at [`MAX_RETRY_DELAY`]
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

async fn try_create_client(url: &str, client_name: &str, max_reconnects: usize) -> Result<Client> {
    async_nats::ConnectOptions::new()
        .name(client_name)
        .max_reconnects(Some(max_reconnects))
        .connect(url)
        .await
        .map_err(|e| Error::Messaging(format!("Failed to connect to NATS server at '{}': {}", url, e)))
}
