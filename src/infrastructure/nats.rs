//! Event publication on NATS

use async_trait::async_trait;
use tracing::debug;

use crate::domain::events::DomainEvent;
use crate::ports::EventPublisher;
use crate::PublishError;

/// Core NATS publish; no acknowledgement is awaited.
#[derive(Clone)]
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    /// Push buffered messages to the server before shutdown.
    pub async fn flush(&self) -> Result<(), PublishError> {
        self.client.flush().await.map_err(|e| PublishError::Transport(e.to_string()))
    }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        let payload = event.payload()?;
        self.client
            .publish(event.subject().to_string(), payload.into())
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        debug!(subject = event.subject(), id = event.entity_id(), "event published");
        Ok(())
    }
}

/// Stand-in used when the bus could not be reached at startup.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPublisher;

#[async_trait]
impl EventPublisher for DisabledPublisher {
    async fn publish(&self, _event: &DomainEvent) -> Result<(), PublishError> {
        Err(PublishError::Transport("event bus not connected".into()))
    }
}
