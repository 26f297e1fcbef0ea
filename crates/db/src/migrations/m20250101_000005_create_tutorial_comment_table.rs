//! Create `tutorial_comment` table migration.

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
                    .table(TutorialComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TutorialComment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TutorialComment::TutorialId).string_len(32).not_null())
                    .col(ColumnDef::new(TutorialComment::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(TutorialComment::Content).text().not_null())
                    .col(
                        ColumnDef::new(TutorialComment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_comment_tutorial")
                            .from(TutorialComment::Table, TutorialComment::TutorialId)
                            .to(Tutorial::Table, Tutorial::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_comment_user")
                            .from(TutorialComment::Table, TutorialComment::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_comment_tutorial_id")
                    .table(TutorialComment::Table)
                    .col(TutorialComment::TutorialId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_comment_user_id")
                    .table(TutorialComment::Table)
                    .col(TutorialComment::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TutorialComment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TutorialComment {
    Table,
    Id,
    TutorialId,
    UserId,
    Content,
    CreatedAt,
}
