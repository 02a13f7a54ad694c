//! Like entity. `(post_id, liker_id)` carries a unique index.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use agora_core::domain::Like;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "likes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub liker_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Like> for ActiveModel {
    fn from(like: &Like) -> Self {
        Self {
            id: Set(like.id),
            post_id: Set(like.post_id),
            liker_id: Set(like.liker_id.clone()),
        }
    }
}
