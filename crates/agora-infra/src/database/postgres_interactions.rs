//! PostgreSQL repositories for comments, likes and views.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use agora_core::domain::{Comment, Like, LikeToggle, Pagination, View};
use agora_core::error::RepoError;
use agora_core::ports::{CommentRepository, LikeRepository, ViewRepository};

use super::entity::{comment, like, view};
use super::postgres_base::{db_err, insert_err, is_unique_violation, post_exists};

pub struct PostgresCommentRepository {
    db: Arc<DbConn>,
}

impl PostgresCommentRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create_comment(&self, comment: Comment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel::from(&comment)
            .insert(self.db.as_ref())
            .await
            .map_err(insert_err)?;
        Ok(model.into())
    }

    async fn list_comments(
        &self,
        post_id: Uuid,
        pagination: Pagination,
    ) -> Result<(Vec<Comment>, u64), RepoError> {
        let select = comment::Entity::find().filter(comment::Column::PostId.eq(post_id));

        let total = select.clone().count(self.db.as_ref()).await.map_err(db_err)?;
        let comments = select
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .offset(pagination.offset())
            .limit(pagination.page_size())
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Comment::from)
            .collect();

        Ok((comments, total))
    }
}

pub struct PostgresLikeRepository {
    db: Arc<DbConn>,
}

impl PostgresLikeRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LikeRepository for PostgresLikeRepository {
    async fn toggle_like(&self, post_id: Uuid, liker_id: &str) -> Result<LikeToggle, RepoError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        if !post_exists(&txn, post_id).await? {
            return Err(RepoError::NotFound);
        }

        let removed = like::Entity::delete_many()
            .filter(like::Column::PostId.eq(post_id))
            .filter(like::Column::LikerId.eq(liker_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let outcome = if removed.rows_affected > 0 {
            LikeToggle::Removed
        } else {
            // A concurrent toggle by the same liker may insert between our
            // delete and this insert. The unique index turns that race into a
            // removal so the pair still ends up at most once.
            let savepoint = txn.begin().await.map_err(db_err)?;
            match like::ActiveModel::from(&Like::new(post_id, liker_id.to_string()))
                .insert(&savepoint)
                .await
            {
                Ok(_) => {
                    savepoint.commit().await.map_err(db_err)?;
                    LikeToggle::Added
                }
                Err(e) if is_unique_violation(&e) => {
                    savepoint.rollback().await.map_err(db_err)?;
                    like::Entity::delete_many()
                        .filter(like::Column::PostId.eq(post_id))
                        .filter(like::Column::LikerId.eq(liker_id))
                        .exec(&txn)
                        .await
                        .map_err(db_err)?;
                    LikeToggle::Removed
                }
                Err(e) => return Err(insert_err(e)),
            }
        };

        txn.commit().await.map_err(db_err)?;
        Ok(outcome)
    }

    async fn count_likes(&self, post_id: Uuid) -> Result<u64, RepoError> {
        like::Entity::find()
            .filter(like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }
}

pub struct PostgresViewRepository {
    db: Arc<DbConn>,
}

impl PostgresViewRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ViewRepository for PostgresViewRepository {
    async fn record_view(&self, post_id: Uuid, viewer_id: &str) -> Result<bool, RepoError> {
        let seen = view_exists(self.db.as_ref(), post_id, viewer_id).await?;
        if seen {
            return Ok(false);
        }

        match view::ActiveModel::from(&View::new(post_id, viewer_id.to_string()))
            .insert(self.db.as_ref())
            .await
        {
            Ok(_) => Ok(true),
            // Lost the race against a concurrent first view.
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(insert_err(e)),
        }
    }

    async fn count_views(&self, post_id: Uuid) -> Result<u64, RepoError> {
        view::Entity::find()
            .filter(view::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }
}

async fn view_exists(db: &DbConn, post_id: Uuid, viewer_id: &str) -> Result<bool, RepoError> {
    let count = view::Entity::find()
        .filter(view::Column::PostId.eq(post_id))
        .filter(view::Column::ViewerId.eq(viewer_id))
        .count(db)
        .await
        .map_err(db_err)?;
    Ok(count > 0)
}
