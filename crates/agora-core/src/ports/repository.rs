use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, LikeToggle, Pagination, Post};
use crate::error::RepoError;

/// Filters for a post listing, applied conjunctively.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub pagination: Pagination,
    /// Restrict to one creator when set.
    pub creator_id: Option<String>,
    /// Match posts carrying any of these tags. Empty means no tag filter.
    pub tags: Vec<String>,
    /// When false only public posts and the requester's own posts match.
    pub include_private: bool,
    pub requester_id: String,
}

/// Post repository - owns a post and its tag associations.
///
/// Create, update and delete are each one atomic unit of work.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Store a new post and associate it with `tag_names`, creating any tag
    /// that does not exist yet. Returns the post with tags attached.
    async fn create_post(&self, post: Post, tag_names: &[String]) -> Result<Post, RepoError>;

    /// Find a post with its tags. `Ok(None)` when it does not exist.
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Save scalar fields and replace the whole tag set.
    /// `RepoError::NotFound` when the post vanished concurrently.
    async fn update_post(&self, post: Post, tag_names: &[String]) -> Result<Post, RepoError>;

    /// Delete a post together with its tag associations and interactions.
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;

    /// One page of matching posts and the total match count.
    async fn list_posts(&self, query: &PostQuery) -> Result<(Vec<Post>, u64), RepoError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, comment: Comment) -> Result<Comment, RepoError>;

    /// Newest first, with the total comment count of the post.
    async fn list_comments(
        &self,
        post_id: Uuid,
        pagination: Pagination,
    ) -> Result<(Vec<Comment>, u64), RepoError>;
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Flip the (post, liker) like. `RepoError::NotFound` when the post is absent.
    async fn toggle_like(&self, post_id: Uuid, liker_id: &str) -> Result<LikeToggle, RepoError>;

    async fn count_likes(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait ViewRepository: Send + Sync {
    /// Record the first view of `viewer_id`. Returns whether a row was inserted.
    async fn record_view(&self, post_id: Uuid, viewer_id: &str) -> Result<bool, RepoError>;

    async fn count_views(&self, post_id: Uuid) -> Result<u64, RepoError>;
}
