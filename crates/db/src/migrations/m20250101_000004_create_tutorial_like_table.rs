//! Create `tutorial_like` table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_profile_table::Profile;
use super::m20250101_000003_create_tutorial_table::Tutorial;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TutorialLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TutorialLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TutorialLike::TutorialId).string_len(32).not_null())
                    .col(ColumnDef::new(TutorialLike::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(TutorialLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_like_tutorial")
                            .from(TutorialLike::Table, TutorialLike::TutorialId)
                            .to(Tutorial::Table, Tutorial::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_like_user")
                            .from(TutorialLike::Table, TutorialLike::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_like_tutorial_id")
                    .table(TutorialLike::Table)
                    .col(TutorialLike::TutorialId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_like_user_id")
                    .table(TutorialLike::Table)
                    .col(TutorialLike::UserId)
                    .to_owned(),
            )
            .await?;

        // One row per (tutorial, user)
        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_like_unique")
                    .table(TutorialLike::Table)
                    .col(TutorialLike::TutorialId)
                    .col(TutorialLike::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TutorialLike::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TutorialLike {
    Table,
    Id,
    TutorialId,
    UserId,
    CreatedAt,
}
