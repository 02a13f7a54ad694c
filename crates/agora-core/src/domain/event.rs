//! Notifications published to external subscribers after state changes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PostViewed,
    PostLiked,
    PostCommented,
}

impl EventType {
    /// Bus topic each event type is published on.
    pub fn topic(self) -> &'static str {
        match self {
            EventType::PostViewed => "post_views",
            EventType::PostLiked => "post_likes",
            EventType::PostCommented => "post_comments",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_type: EventType,
    pub user_id: String,
    pub entity_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl DomainEvent {
    pub fn new(event_type: EventType, user_id: impl Into<String>, entity_id: Uuid) -> Self {
        Self {
            event_type,
            user_id: user_id.into(),
            entity_id,
            data: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn topic(&self) -> &'static str {
        self.event_type.topic()
    }
}
