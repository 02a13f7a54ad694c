//! Helpers shared by the SeaORM repositories.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, SqlErr};
use uuid::Uuid;

use agora_core::domain::Tag;
use agora_core::error::RepoError;

use super::entity::{post, post_tag, tag};

/// Map a SeaORM error onto the repository taxonomy.
pub(crate) fn db_err(err: DbErr) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => return RepoError::Constraint(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => return RepoError::Constraint(msg),
        _ => {}
    }
    match err {
        DbErr::ConnectionAcquire(e) => RepoError::Connection(e.to_string()),
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        other => {
            tracing::error!(error = %other, "Database query failed");
            RepoError::Query(other.to_string())
        }
    }
}

/// Inserts referencing a post that no longer exists fail the foreign key;
/// report those as a missing post.
pub(crate) fn insert_err(err: DbErr) -> RepoError {
    if matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_))) {
        RepoError::NotFound
    } else {
        db_err(err)
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) async fn post_exists<C: ConnectionTrait>(
    conn: &C,
    post_id: Uuid,
) -> Result<bool, RepoError> {
    let found = post::Entity::find_by_id(post_id)
        .one(conn)
        .await
        .map_err(db_err)?;
    Ok(found.is_some())
}

/// Load the ordered tag list of every post in `post_ids`.
pub(crate) async fn load_tags<C: ConnectionTrait>(
    conn: &C,
    post_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Tag>>, RepoError> {
    let mut by_post: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    if post_ids.is_empty() {
        return Ok(by_post);
    }

    let links = post_tag::Entity::find()
        .filter(post_tag::Column::PostId.is_in(post_ids.iter().copied()))
        .order_by_asc(post_tag::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)?;
    if links.is_empty() {
        return Ok(by_post);
    }

    let tag_ids: Vec<Uuid> = links.iter().map(|l| l.tag_id).collect();
    let tags: HashMap<Uuid, Tag> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tag_ids))
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|m| (m.id, Tag::from(m)))
        .collect();

    for link in links {
        if let Some(tag) = tags.get(&link.tag_id) {
            by_post.entry(link.post_id).or_default().push(tag.clone());
        }
    }

    Ok(by_post)
}
