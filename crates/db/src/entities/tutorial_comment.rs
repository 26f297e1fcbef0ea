//! Tutorial comment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A comment on a tutorial. Append-only: comments are created and deleted,
/// never edited.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tutorial_comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub tutorial_id: String,

    /// Comment author
    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::tutorial::Entity",
        from = "Column::TutorialId",
        to = "super::tutorial::Column::Id",
        on_delete = "Cascade"
    )]
    Tutorial,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::tutorial::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tutorial.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
