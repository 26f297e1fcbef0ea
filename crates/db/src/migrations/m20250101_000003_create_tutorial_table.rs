//! Create `tutorial` table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_profile_table::Profile;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tutorial::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tutorial::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tutorial::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Tutorial::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Tutorial::Description).text().not_null())
                    .col(
                        ColumnDef::new(Tutorial::Category)
                            .string_len(16)
                            .not_null()
                            .check(Expr::col(Tutorial::Category).is_in([
                                "programming",
                                "design",
                                "music",
                                "art",
                                "cooking",
                                "photography",
                                "business",
                                "fitness",
                                "languages",
                                "other",
                            ])),
                    )
                    .col(
                        ColumnDef::new(Tutorial::Difficulty)
                            .string_len(16)
                            .not_null()
                            .check(Expr::col(Tutorial::Difficulty).is_in([
                                "beginner",
                                "intermediate",
                                "advanced",
                            ])),
                    )
                    .col(ColumnDef::new(Tutorial::ThumbnailUrl).string_len(512))
                    .col(ColumnDef::new(Tutorial::VideoUrl).string_len(512))
                    .col(ColumnDef::new(Tutorial::Resources).json_binary().not_null())
                    .col(
                        ColumnDef::new(Tutorial::LikesCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Tutorial::LikesCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Tutorial::CommentsCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Tutorial::CommentsCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Tutorial::EnrollmentsCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Tutorial::EnrollmentsCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Tutorial::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tutorial::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_user")
                            .from(Tutorial::Table, Tutorial::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_user_id")
                    .table(Tutorial::Table)
                    .col(Tutorial::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_category")
                    .table(Tutorial::Table)
                    .col(Tutorial::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_difficulty")
                    .table(Tutorial::Table)
                    .col(Tutorial::Difficulty)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_created_at")
                    .table(Tutorial::Table)
                    .col(Tutorial::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_likes_count")
                    .table(Tutorial::Table)
                    .col(Tutorial::LikesCount)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tutorial::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Tutorial {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Category,
    Difficulty,
    ThumbnailUrl,
    VideoUrl,
    Resources,
    LikesCount,
    CommentsCount,
    EnrollmentsCount,
    CreatedAt,
    UpdatedAt,
}
