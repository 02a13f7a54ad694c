//! In-memory storage.
//!
//! Used when no `DATABASE_URL` is configured and by the request-layer tests.
//! All tables sit behind one lock and every operation holds the write lock
//! for its whole unit of work, so each call is atomic with respect to every
//! other call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use agora_core::domain::{Comment, LikeToggle, Pagination, Post, Tag};
use agora_core::error::RepoError;
use agora_core::ports::{
    CommentRepository, LikeRepository, PostQuery, PostRepository, ViewRepository,
};

struct StoredPost {
    /// Insertion sequence, breaks `created_at` ties newest first.
    seq: u64,
    post: Post,
}

#[derive(Default)]
struct Tables {
    next_seq: u64,
    posts: HashMap<Uuid, StoredPost>,
    /// Tag registry keyed by name.
    tags: HashMap<String, Tag>,
    comments: HashMap<Uuid, Vec<Comment>>,
    likes: HashMap<Uuid, HashSet<String>>,
    views: HashMap<Uuid, HashSet<String>>,
}

impl Tables {
    fn resolve_tags(&mut self, names: &[String]) -> Vec<Tag> {
        names
            .iter()
            .map(|name| {
                self.tags
                    .entry(name.clone())
                    .or_insert_with(|| Tag::new(name.clone()))
                    .clone()
            })
            .collect()
    }
}

fn window<T>(items: Vec<T>, pagination: Pagination) -> Vec<T> {
    let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
    let size = usize::try_from(pagination.page_size()).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(size).collect()
}

/// Every repository port backed by process memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create_post(&self, post: Post, tag_names: &[String]) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint(format!("post {} already exists", post.id)));
        }

        let tags = tables.resolve_tags(tag_names);
        let post = Post { tags, ..post };
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.posts.insert(
            post.id,
            StoredPost {
                seq,
                post: post.clone(),
            },
        );
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).map(|stored| stored.post.clone()))
    }

    async fn update_post(&self, post: Post, tag_names: &[String]) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }

        let tags = tables.resolve_tags(tag_names);
        let post = Post { tags, ..post };
        if let Some(stored) = tables.posts.get_mut(&post.id) {
            stored.post = post.clone();
        }
        Ok(post)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        tables.comments.remove(&id);
        tables.likes.remove(&id);
        tables.views.remove(&id);
        Ok(())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<(Vec<Post>, u64), RepoError> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&StoredPost> = tables
            .posts
            .values()
            .filter(|s| {
                query
                    .creator_id
                    .as_deref()
                    .is_none_or(|creator| s.post.creator_id == creator)
            })
            .filter(|s| query.include_private || s.post.is_visible_to(&query.requester_id))
            .filter(|s| {
                query.tags.is_empty()
                    || s.post.tags.iter().any(|t| query.tags.contains(&t.name))
            })
            .collect();
        matching.sort_by(|a, b| {
            b.post
                .created_at
                .cmp(&a.post.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        let total = matching.len() as u64;
        let posts = matching.into_iter().map(|s| s.post.clone()).collect();
        Ok((window(posts, query.pagination), total))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create_comment(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::NotFound);
        }
        tables
            .comments
            .entry(comment.post_id)
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(
        &self,
        post_id: Uuid,
        pagination: Pagination,
    ) -> Result<(Vec<Comment>, u64), RepoError> {
        let tables = self.tables.read().await;
        let Some(comments) = tables.comments.get(&post_id) else {
            return Ok((Vec::new(), 0));
        };

        // Reverse insertion order first so the stable sort keeps later
        // comments ahead on equal timestamps.
        let mut ordered: Vec<Comment> = comments.iter().rev().cloned().collect();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = ordered.len() as u64;
        Ok((window(ordered, pagination), total))
    }
}

#[async_trait]
impl LikeRepository for InMemoryStore {
    async fn toggle_like(&self, post_id: Uuid, liker_id: &str) -> Result<LikeToggle, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(RepoError::NotFound);
        }

        let likers = tables.likes.entry(post_id).or_default();
        if likers.remove(liker_id) {
            Ok(LikeToggle::Removed)
        } else {
            likers.insert(liker_id.to_string());
            Ok(LikeToggle::Added)
        }
    }

    async fn count_likes(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.likes.get(&post_id).map_or(0, |l| l.len() as u64))
    }
}

#[async_trait]
impl ViewRepository for InMemoryStore {
    async fn record_view(&self, post_id: Uuid, viewer_id: &str) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(RepoError::NotFound);
        }
        Ok(tables
            .views
            .entry(post_id)
            .or_default()
            .insert(viewer_id.to_string()))
    }

    async fn count_views(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.views.get(&post_id).map_or(0, |v| v.len() as u64))
    }
}
