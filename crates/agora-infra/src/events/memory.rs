//! In-process event bus.
//!
//! The fallback when Redis is not configured or unreachable. Subscribers only
//! see events published after they subscribed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use agora_core::domain::DomainEvent;
use agora_core::ports::{EventPublisher, PublishError};

/// Broadcast channel per topic, created on first subscription.
#[derive(Clone)]
pub struct InMemoryEventBus {
    topics: Arc<RwLock<HashMap<String, broadcast::Sender<DomainEvent>>>>,
    buffer_size: usize,
}

impl InMemoryEventBus {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            buffer_size,
        }
    }

    /// Receive every event published to `topic` from now on.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<DomainEvent> {
        let mut topics = self.topics.write().await;
        let sender = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);
        tracing::debug!(topic = %topic, "Subscribed to topic");
        sender.subscribe()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, topic: &str, event: &DomainEvent) -> Result<(), PublishError> {
        let topics = self.topics.read().await;

        match topics.get(topic) {
            Some(sender) => {
                // A send error only means every receiver has been dropped.
                let delivered = sender.send(event.clone()).unwrap_or(0);
                tracing::debug!(topic = %topic, receivers = delivered, "Event published");
            }
            None => tracing::debug!(topic = %topic, "No subscribers for topic"),
        }

        Ok(())
    }
}
