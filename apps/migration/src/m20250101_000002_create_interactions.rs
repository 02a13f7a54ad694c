//! Comments, likes and views. Each row cascades with its post.

use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_posts::Posts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Comments::PostId).uuid().not_null())
                    .col(ColumnDef::new(Comments::AuthorId).string().not_null())
                    .col(ColumnDef::new(Comments::Content).text().not_null())
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_post")
                            .from(Comments::Table, Comments::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_post_id")
                    .table(Comments::Table)
                    .col(Comments::PostId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Likes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Likes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Likes::PostId).uuid().not_null())
                    .col(ColumnDef::new(Likes::LikerId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_post")
                            .from(Likes::Table, Likes::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_likes_post_liker")
                    .table(Likes::Table)
                    .col(Likes::PostId)
                    .col(Likes::LikerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Views::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Views::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Views::PostId).uuid().not_null())
                    .col(ColumnDef::new(Views::ViewerId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_views_post")
                            .from(Views::Table, Views::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_views_post_viewer")
                    .table(Views::Table)
                    .col(Views::PostId)
                    .col(Views::ViewerId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Views::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Likes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    PostId,
    AuthorId,
    Content,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Likes {
    Table,
    Id,
    PostId,
    LikerId,
}

#[derive(DeriveIden)]
enum Views {
    Table,
    Id,
    PostId,
    ViewerId,
}
