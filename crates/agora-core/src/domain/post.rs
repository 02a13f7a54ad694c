use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Tag;

/// Who may see a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn from_private(is_private: bool) -> Self {
        if is_private {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    pub fn is_private(self) -> bool {
        self == Visibility::Private
    }
}

/// Post entity - user-authored content with its ordered tag set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Opaque identity supplied by the gateway. Never changes after creation.
    pub creator_id: String,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<Tag>,
}

impl Post {
    /// Create a new post with a generated id and no tags attached yet.
    pub fn new(
        creator_id: String,
        title: String,
        description: Option<String>,
        visibility: Visibility,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            creator_id,
            visibility,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        }
    }

    pub fn is_private(&self) -> bool {
        self.visibility.is_private()
    }

    pub fn is_owned_by(&self, caller_id: &str) -> bool {
        self.creator_id == caller_id
    }

    /// Private posts are visible to their creator only.
    pub fn is_visible_to(&self, caller_id: &str) -> bool {
        !self.is_private() || self.is_owned_by(caller_id)
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }
}
