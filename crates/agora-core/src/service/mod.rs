//! Request layer - orchestrates repositories and the event publisher per call
//! and enforces existence, ownership and visibility rules.
//!
//! Checks always run in the same order: the target post is resolved first
//! (not found), then ownership or visibility (permission denied), then field
//! validation (invalid argument), and only then is state mutated.

mod commands;

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    Comment, DomainEvent, EventType, Page, Pagination, Post, Visibility, normalize_tag_names,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{
    CommentRepository, EventPublisher, LikeRepository, PostQuery, PostRepository, ViewRepository,
};

pub use commands::{CreatePost, LikeResult, ListComments, ListPosts, UpdatePost, ViewResult};

/// The post/interaction service.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    likes: Arc<dyn LikeRepository>,
    views: Arc<dyn ViewRepository>,
    events: Arc<dyn EventPublisher>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        likes: Arc<dyn LikeRepository>,
        views: Arc<dyn ViewRepository>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            posts,
            comments,
            likes,
            views,
            events,
        }
    }

    #[instrument(skip(self, cmd), fields(creator_id = %cmd.creator_id))]
    pub async fn create_post(&self, cmd: CreatePost) -> Result<Post, DomainError> {
        if cmd.creator_id.trim().is_empty() {
            return Err(DomainError::invalid("post creator id is required"));
        }
        if cmd.title.trim().is_empty() {
            return Err(DomainError::invalid("post title is required"));
        }

        let tags = normalize_tag_names(&cmd.tags);
        let post = Post::new(
            cmd.creator_id,
            cmd.title,
            cmd.description.filter(|d| !d.is_empty()),
            Visibility::from_private(cmd.is_private),
        );

        let created = self.posts.create_post(post, &tags).await?;
        info!(post_id = %created.id, tags = created.tags.len(), "post created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_post(&self, id: Uuid, requester_id: &str) -> Result<Post, DomainError> {
        self.load_visible_post(id, requester_id, "view").await
    }

    #[instrument(skip(self, cmd), fields(post_id = %cmd.id, updater_id = %cmd.updater_id))]
    pub async fn update_post(&self, cmd: UpdatePost) -> Result<Post, DomainError> {
        let mut post = self.load_post(cmd.id).await?;
        if !post.is_owned_by(&cmd.updater_id) {
            return Err(DomainError::denied(
                "you don't have permission to update this post",
            ));
        }

        if let Some(title) = cmd.title.filter(|t| !t.trim().is_empty()) {
            post.title = title;
        }
        if let Some(description) = cmd.description {
            post.description = Some(description).filter(|d| !d.is_empty());
        }
        post.visibility = Visibility::from_private(cmd.is_private);
        post.updated_at = chrono::Utc::now();

        let tags = normalize_tag_names(&cmd.tags);
        let updated = self
            .posts
            .update_post(post, &tags)
            .await
            .map_err(|e| not_found_or_internal(e, cmd.id))?;

        info!(post_id = %updated.id, "post updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: Uuid, deleter_id: &str) -> Result<(), DomainError> {
        let post = self.load_post(id).await?;
        if !post.is_owned_by(deleter_id) {
            return Err(DomainError::denied(
                "you don't have permission to delete this post",
            ));
        }

        self.posts
            .delete_post(id)
            .await
            .map_err(|e| not_found_or_internal(e, id))?;

        info!(post_id = %id, "post deleted");
        Ok(())
    }

    #[instrument(skip(self, cmd), fields(requester_id = %cmd.requester_id))]
    pub async fn list_posts(&self, cmd: ListPosts) -> Result<Page<Post>, DomainError> {
        let pagination = Pagination::new(cmd.page, cmd.page_size)?;
        let creator_id = cmd.creator_id.filter(|c| !c.is_empty());

        // Callers listing their own posts see the private ones too.
        let include_private = creator_id.as_deref() == Some(cmd.requester_id.as_str());

        let query = PostQuery {
            pagination,
            creator_id,
            tags: normalize_tag_names(&cmd.tags),
            include_private,
            requester_id: cmd.requester_id,
        };

        let (posts, total) = self.posts.list_posts(&query).await?;
        debug!(returned = posts.len(), total, "posts listed");
        Ok(Page::new(posts, total, pagination))
    }

    /// Record a view and return the post. A `post_viewed` event is emitted on
    /// every call, whether or not this was the viewer's first view.
    #[instrument(skip(self))]
    pub async fn view_post(&self, post_id: Uuid, viewer_id: &str) -> Result<ViewResult, DomainError> {
        let post = self.load_visible_post(post_id, viewer_id, "view").await?;

        let first_view = self
            .views
            .record_view(post_id, viewer_id)
            .await
            .map_err(|e| not_found_or_internal(e, post_id))?;

        self.emit(DomainEvent::new(EventType::PostViewed, viewer_id, post_id))
            .await;

        Ok(ViewResult { post, first_view })
    }

    /// Flip the caller's like. `post_liked` is emitted only when a like is added.
    #[instrument(skip(self))]
    pub async fn like_post(&self, post_id: Uuid, liker_id: &str) -> Result<LikeResult, DomainError> {
        self.load_visible_post(post_id, liker_id, "like").await?;

        let toggle = self
            .likes
            .toggle_like(post_id, liker_id)
            .await
            .map_err(|e| not_found_or_internal(e, post_id))?;
        let total_likes = self.likes.count_likes(post_id).await?;

        if toggle.is_added() {
            self.emit(DomainEvent::new(EventType::PostLiked, liker_id, post_id))
                .await;
        }

        debug!(?toggle, total_likes, "like toggled");
        Ok(LikeResult {
            liked: toggle.is_added(),
            total_likes,
        })
    }

    #[instrument(skip(self, content))]
    pub async fn comment_post(
        &self,
        post_id: Uuid,
        author_id: &str,
        content: String,
    ) -> Result<Comment, DomainError> {
        self.load_visible_post(post_id, author_id, "comment on")
            .await?;
        if content.trim().is_empty() {
            return Err(DomainError::invalid("comment content cannot be empty"));
        }

        let comment = self
            .comments
            .create_comment(Comment::new(post_id, author_id.to_string(), content))
            .await
            .map_err(|e| not_found_or_internal(e, post_id))?;

        let event = DomainEvent::new(EventType::PostCommented, author_id, post_id).with_data(
            json!({
                "comment_id": comment.id,
                "content": comment.content,
            }),
        );
        self.emit(event).await;

        info!(comment_id = %comment.id, "comment created");
        Ok(comment)
    }

    #[instrument(skip(self, cmd), fields(post_id = %cmd.post_id))]
    pub async fn list_comments(&self, cmd: ListComments) -> Result<Page<Comment>, DomainError> {
        self.load_visible_post(cmd.post_id, &cmd.requester_id, "view")
            .await?;
        let pagination = Pagination::new(cmd.page, cmd.page_size)?;

        let (comments, total) = self.comments.list_comments(cmd.post_id, pagination).await?;
        Ok(Page::new(comments, total, pagination))
    }

    async fn load_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_post(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    async fn load_visible_post(
        &self,
        id: Uuid,
        caller_id: &str,
        action: &str,
    ) -> Result<Post, DomainError> {
        let post = self.load_post(id).await?;
        if !post.is_visible_to(caller_id) {
            return Err(DomainError::denied(format!(
                "you don't have permission to {action} this post"
            )));
        }
        Ok(post)
    }

    /// Publish after the mutation has committed. Failures never reach the caller.
    async fn emit(&self, event: DomainEvent) {
        let topic = event.topic();
        match self.events.publish(topic, &event).await {
            Ok(()) => debug!(topic, entity_id = %event.entity_id, "event published"),
            Err(e) => warn!(
                topic,
                entity_id = %event.entity_id,
                error = %e,
                "failed to publish event"
            ),
        }
    }
}

/// A post that vanished between the existence check and the write is reported
/// as not found rather than as a storage failure.
fn not_found_or_internal(err: RepoError, post_id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::post_not_found(post_id),
        other => other.into(),
    }
}
