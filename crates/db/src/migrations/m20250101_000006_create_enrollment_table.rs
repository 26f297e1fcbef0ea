//! Create `enrollment` table migration.

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
                    .table(Enrollment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Enrollment::TutorialId).string_len(32).not_null())
                    .col(ColumnDef::new(Enrollment::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Enrollment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_tutorial")
                            .from(Enrollment::Table, Enrollment::TutorialId)
                            .to(Tutorial::Table, Tutorial::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_user")
                            .from(Enrollment::Table, Enrollment::UserId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrollment_tutorial_id")
                    .table(Enrollment::Table)
                    .col(Enrollment::TutorialId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrollment_user_id")
                    .table(Enrollment::Table)
                    .col(Enrollment::UserId)
                    .to_owned(),
            )
            .await?;

        // One row per (tutorial, user)
        manager
            .create_index(
                Index::create()
                    .name("idx_enrollment_unique")
                    .table(Enrollment::Table)
                    .col(Enrollment::TutorialId)
                    .col(Enrollment::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Enrollment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Enrollment {
    Table,
    Id,
    TutorialId,
    UserId,
    CreatedAt,
}
