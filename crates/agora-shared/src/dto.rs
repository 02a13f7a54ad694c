//! Data Transfer Objects - request/response types for the API.
//!
//! Identifiers travel as strings and timestamps as RFC 3339 strings.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/posts`. The creator is the calling identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of `PUT /api/posts/{id}`.
///
/// `title` and `description` are optional; `is_private` and `tags` replace
/// the stored values (missing means public and untagged).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Query string of `GET /api/posts`. `tags` is comma separated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl ListPostsQuery {
    /// Split the comma separated tag filter.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Query string of `GET /api/posts/{id}/comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCommentsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

/// Body of `POST /api/posts/{id}/comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub creator_id: String,
    pub is_private: bool,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total_count: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewPostResponse {
    pub success: bool,
    pub post: PostResponse,
    /// Whether this request recorded the caller's first view.
    pub first_view: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikePostResponse {
    pub success: bool,
    /// True when the like was added, false when it was removed.
    pub liked: bool,
    pub total_likes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
    pub total_count: u64,
    pub total_pages: u64,
}
