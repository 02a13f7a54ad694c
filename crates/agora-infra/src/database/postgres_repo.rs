//! PostgreSQL post repository and the tag registry it maintains.
//!
//! Every write runs inside one transaction. Dropping the transaction without
//! committing (an early `?` return or a cancelled future) rolls it back.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, DbConn, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use agora_core::domain::{Post, Tag};
use agora_core::error::RepoError;
use agora_core::ports::{PostQuery, PostRepository};

use super::entity::{comment, like, post, post_tag, tag, view};
use super::postgres_base::{db_err, is_unique_violation, load_tags};

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: Arc<DbConn>,
}

impl PostgresPostRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

/// Look a tag up by name and create it on a miss.
///
/// The insert runs in a savepoint: when a concurrent transaction created the
/// same name first, the unique index rejects ours, the savepoint is rolled
/// back and the winner's row is read instead.
async fn find_or_create_tag(txn: &DatabaseTransaction, name: &str) -> Result<Tag, RepoError> {
    let existing = tag::Entity::find()
        .filter(tag::Column::Name.eq(name))
        .one(txn)
        .await
        .map_err(db_err)?;
    if let Some(model) = existing {
        return Ok(model.into());
    }

    let candidate = Tag::new(name.to_string());
    let savepoint = txn.begin().await.map_err(db_err)?;
    match tag::ActiveModel::from(&candidate).insert(&savepoint).await {
        Ok(model) => {
            savepoint.commit().await.map_err(db_err)?;
            tracing::debug!(tag = %name, tag_id = %model.id, "Tag created");
            Ok(model.into())
        }
        Err(e) if is_unique_violation(&e) => {
            savepoint.rollback().await.map_err(db_err)?;
            tag::Entity::find()
                .filter(tag::Column::Name.eq(name))
                .one(txn)
                .await
                .map_err(db_err)?
                .map(Into::into)
                .ok_or_else(|| RepoError::Query(format!("tag '{name}' missing after conflict")))
        }
        Err(e) => Err(db_err(e)),
    }
}

/// Resolve `names` and link them to the post in the given order.
async fn attach_tags(
    txn: &DatabaseTransaction,
    post_id: Uuid,
    names: &[String],
) -> Result<Vec<Tag>, RepoError> {
    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        tags.push(find_or_create_tag(txn, name).await?);
    }

    if !tags.is_empty() {
        let links = tags
            .iter()
            .enumerate()
            .map(|(position, tag)| post_tag::ActiveModel {
                post_id: sea_orm::Set(post_id),
                tag_id: sea_orm::Set(tag.id),
                position: sea_orm::Set(position as i32),
            });
        post_tag::Entity::insert_many(links)
            .exec_without_returning(txn)
            .await
            .map_err(db_err)?;
    }

    Ok(tags)
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, post: Post, tag_names: &[String]) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        post::ActiveModel::from(&post)
            .insert(&txn)
            .await
            .map_err(db_err)?;
        let tags = attach_tags(&txn, post.id, tag_names).await?;

        txn.commit().await.map_err(db_err)?;

        tracing::debug!(post_id = %post.id, tags = tags.len(), "Post stored");
        Ok(Post { tags, ..post })
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let Some(model) = post::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let mut tags = load_tags(self.db.as_ref(), &[id]).await?;
        Ok(Some(model.into_domain(tags.remove(&id).unwrap_or_default())))
    }

    async fn update_post(&self, post: Post, tag_names: &[String]) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let updated = post::Entity::update_many()
            .col_expr(post::Column::Title, Expr::value(post.title.clone()))
            .col_expr(post::Column::Description, Expr::value(post.description.clone()))
            .col_expr(post::Column::IsPrivate, Expr::value(post.is_private()))
            .col_expr(
                post::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(post.updated_at)),
            )
            .filter(post::Column::Id.eq(post.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if updated.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        post_tag::Entity::delete_many()
            .filter(post_tag::Column::PostId.eq(post.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let tags = attach_tags(&txn, post.id, tag_names).await?;

        txn.commit().await.map_err(db_err)?;

        tracing::debug!(post_id = %post.id, tags = tags.len(), "Post saved");
        Ok(Post { tags, ..post })
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        // Interaction rows go with the post, not only through ON DELETE CASCADE.
        post_tag::Entity::delete_many()
            .filter(post_tag::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        comment::Entity::delete_many()
            .filter(comment::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        like::Entity::delete_many()
            .filter(like::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        view::Entity::delete_many()
            .filter(view::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let deleted = post::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if deleted.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(db_err)?;

        tracing::debug!(post_id = %id, "Post removed");
        Ok(())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<(Vec<Post>, u64), RepoError> {
        let mut select = post::Entity::find();

        if let Some(creator_id) = &query.creator_id {
            select = select.filter(post::Column::CreatorId.eq(creator_id.as_str()));
        }
        if !query.include_private {
            select = select.filter(
                Condition::any()
                    .add(post::Column::IsPrivate.eq(false))
                    .add(post::Column::CreatorId.eq(query.requester_id.as_str())),
            );
        }
        if !query.tags.is_empty() {
            // IN over a subquery keeps one row per post however many tags match.
            let tagged = Query::select()
                .column((post_tag::Entity, post_tag::Column::PostId))
                .from(post_tag::Entity)
                .inner_join(
                    tag::Entity,
                    Expr::col((tag::Entity, tag::Column::Id))
                        .equals((post_tag::Entity, post_tag::Column::TagId)),
                )
                .and_where(tag::Column::Name.is_in(query.tags.iter().cloned()))
                .to_owned();
            select = select.filter(post::Column::Id.in_subquery(tagged));
        }

        let total = select.clone().count(self.db.as_ref()).await.map_err(db_err)?;

        let models = select
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(query.pagination.offset())
            .limit(query.pagination.page_size())
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut tags = load_tags(self.db.as_ref(), &ids).await?;
        let posts = models
            .into_iter()
            .map(|m| {
                let post_tags = tags.remove(&m.id).unwrap_or_default();
                m.into_domain(post_tags)
            })
            .collect();

        Ok((posts, total))
    }
}
