//! Redis pub/sub event publisher.
//!
//! Events are JSON-encoded and sent with `PUBLISH <topic> <json>`. Each
//! publish is bounded by `publish_timeout` so a stalled Redis cannot hold up
//! the request that triggered the event.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use agora_core::domain::DomainEvent;
use agora_core::ports::{EventPublisher, PublishError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    pub connect_timeout: Duration,
    pub publish_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            publish_timeout: Duration::from_millis(1000),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            publish_timeout: std::env::var("EVENT_PUBLISH_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.publish_timeout),
        }
    }
}

/// Redis-backed event publisher.
///
/// The connection manager reconnects on its own after transient failures.
#[derive(Clone)]
pub struct RedisEventPublisher {
    conn: ConnectionManager,
    publish_timeout: Duration,
}

impl RedisEventPublisher {
    pub async fn new(config: RedisConfig) -> Result<Self, PublishError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        // Unreachable Redis must not hang startup.
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| PublishError::Connection("Connection timed out".to_string()))?
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis event bus");

        Ok(Self {
            conn,
            publish_timeout: config.publish_timeout,
        })
    }

    pub async fn from_env() -> Result<Self, PublishError> {
        Self::new(RedisConfig::from_env()).await
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, topic: &str, event: &DomainEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event).map_err(|e| PublishError::Encode(e.to_string()))?;

        let mut conn = self.conn.clone();
        let receivers: i64 = tokio::time::timeout(self.publish_timeout, conn.publish(topic, payload))
            .await
            .map_err(|_| PublishError::Timeout)?
            .map_err(|e| PublishError::Publish(e.to_string()))?;

        tracing::debug!(topic = %topic, receivers, "Event published to Redis");
        Ok(())
    }
}
