//! Inputs and outputs of `PostService` operations.

use uuid::Uuid;

use crate::domain::Post;

#[derive(Debug, Clone, Default)]
pub struct CreatePost {
    pub title: String,
    pub description: Option<String>,
    pub creator_id: String,
    pub is_private: bool,
    pub tags: Vec<String>,
}

/// Absent or blank `title` keeps the current one. Absent `description` keeps
/// the current one and an empty string clears it. Visibility and tags are
/// always replaced.
#[derive(Debug, Clone)]
pub struct UpdatePost {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_private: bool,
    pub tags: Vec<String>,
    pub updater_id: String,
}

/// Raw page numbers are signed so that negative input reaches validation.
#[derive(Debug, Clone, Default)]
pub struct ListPosts {
    pub page: i64,
    pub page_size: i64,
    pub creator_id: Option<String>,
    pub tags: Vec<String>,
    pub requester_id: String,
}

#[derive(Debug, Clone)]
pub struct ListComments {
    pub post_id: Uuid,
    pub page: i64,
    pub page_size: i64,
    pub requester_id: String,
}

#[derive(Debug, Clone)]
pub struct ViewResult {
    pub post: Post,
    /// Whether this call recorded the viewer's first view.
    pub first_view: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeResult {
    /// True when this call added the like, false when it removed it.
    pub liked: bool,
    pub total_likes: u64,
}
