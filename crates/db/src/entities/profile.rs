//! Profile entity.

use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

/// Public profile of an identity. The ID is the identity ID.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    /// Same as identity.id (1:1 relationship)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name
    pub full_name: String,

    /// Short biography
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    /// Avatar image URL
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::identity::Entity",
        from = "Column::Id",
        to = "super::identity::Column::Id",
        on_delete = "Cascade"
    )]
    Identity,
    #[sea_orm(has_many = "super::tutorial::Entity")]
    Tutorials,
}

impl Related<super::identity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Identity.def()
    }
}

impl Related<super::tutorial::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tutorials.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        if insert {
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
            if self.updated_at.is_not_set() {
                self.updated_at = Set(now);
            }
        } else {
            // Always refreshed, whatever the caller supplied
            self.updated_at = Set(now);
        }
        Ok(self)
    }
}
