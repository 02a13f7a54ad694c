//! Event port - abstraction over the external notification bus.

use async_trait::async_trait;

use crate::domain::DomainEvent;

/// Producer side of the event bus. The core never consumes events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event to a topic.
    async fn publish(&self, topic: &str, event: &DomainEvent) -> Result<(), PublishError>;
}

/// Publish errors. Callers in the core log and drop these.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to encode event: {0}")]
    Encode(String),

    #[error("Failed to publish: {0}")]
    Publish(String),

    #[error("Publish timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),
}
