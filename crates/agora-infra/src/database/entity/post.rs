//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use agora_core::domain::{Post, Tag, Visibility};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub creator_id: String,
    pub is_private: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post_tag::Entity")]
    PostTag,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
    #[sea_orm(has_many = "super::like::Entity")]
    Like,
    #[sea_orm(has_many = "super::view::Entity")]
    View,
}

impl Related<super::post_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostTag.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_tag::Relation::Post.def().rev())
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Like.def()
    }
}

impl Related<super::view::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::View.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Build the domain post; tags live in another table and are passed in.
    pub fn into_domain(self, tags: Vec<Tag>) -> Post {
        Post {
            id: self.id,
            title: self.title,
            description: self.description,
            creator_id: self.creator_id,
            visibility: Visibility::from_private(self.is_private),
            created_at: self.created_at.into(),
            updated_at: self.updated_at.into(),
            tags,
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<&Post> for ActiveModel {
    fn from(post: &Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title.clone()),
            description: Set(post.description.clone()),
            creator_id: Set(post.creator_id.clone()),
            is_private: Set(post.is_private()),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
