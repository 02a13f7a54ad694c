//! View entity. `(post_id, viewer_id)` carries a unique index.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use agora_core::domain::View;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "views")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub viewer_id: String,
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

impl From<&View> for ActiveModel {
    fn from(view: &View) -> Self {
        Self {
            id: Set(view.id),
            post_id: Set(view.post_id),
            viewer_id: Set(view.viewer_id.clone()),
        }
    }
}
