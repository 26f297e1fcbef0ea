//! Tutorial like entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tutorial like - a record of a user liking a tutorial.
///
/// `(tutorial_id, user_id)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tutorial_like")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Tutorial that was liked.
    #[sea_orm(indexed)]
    pub tutorial_id: String,

    /// User who liked the tutorial.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// When the like was created.
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
    User,
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
        Relation::User.def()
    }
}

impl Related<super::tutorial::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tutorial.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
