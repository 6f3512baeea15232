//! Optional NATS publication of domain events.

use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

#[derive(Clone, Debug, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn disabled() -> Self { Self { nats: None } }

    pub fn new(nats: async_nats::Client) -> Self { Self { nats: Some(nats) } }

    /// Connects when a URL is configured. A failed connection disables publishing.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disabled() };
        match async_nats::connect(url).await {
            Ok(client) => Self::new(client),
            Err(err) => {
                warn!(%url, error = %err, "NATS unavailable, domain events will not be published");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    /// Best effort; failures are logged.
    pub async fn publish(&self, event: &DomainEvent) {
        let Some(client) = &self.nats else { return };
        let payload = match serde_json::to_vec(event) {
            Ok(p) => p,
            Err(err) => {
                warn!(error = %err, "failed to encode domain event");
                return;
            }
        };
        match client.publish(event.subject().to_string(), payload.into()).await {
            Ok(()) => debug!(subject = event.subject(), "published domain event"),
            Err(err) => warn!(subject = event.subject(), error = %err, "failed to publish domain event"),
        }
    }

    pub async fn publish_all(&self, events: Vec<DomainEvent>) {
        for event in &events {
            self.publish(event).await;
        }
    }
}
