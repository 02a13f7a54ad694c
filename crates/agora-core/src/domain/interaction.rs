//! Interaction entities attached to a post: comments, likes and views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, author_id: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// At most one per (post, liker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Like {
    pub id: Uuid,
    pub post_id: Uuid,
    pub liker_id: String,
}

impl Like {
    pub fn new(post_id: Uuid, liker_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            liker_id,
        }
    }
}

/// At most one per (post, viewer); later views are no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub id: Uuid,
    pub post_id: Uuid,
    pub viewer_id: String,
}

impl View {
    pub fn new(post_id: Uuid, viewer_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            viewer_id,
        }
    }
}

/// Outcome of flipping a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Added,
    Removed,
}

impl LikeToggle {
    pub fn is_added(self) -> bool {
        self == LikeToggle::Added
    }
}
