//! Tutorial entity.

use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

/// Tutorial category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[sea_orm(string_value = "programming")]
    Programming,
    #[sea_orm(string_value = "design")]
    Design,
    #[sea_orm(string_value = "music")]
    Music,
    #[sea_orm(string_value = "art")]
    Art,
    #[sea_orm(string_value = "cooking")]
    Cooking,
    #[sea_orm(string_value = "photography")]
    Photography,
    #[sea_orm(string_value = "business")]
    Business,
    #[sea_orm(string_value = "fitness")]
    Fitness,
    #[sea_orm(string_value = "languages")]
    Languages,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Tutorial difficulty level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[sea_orm(string_value = "beginner")]
    Beginner,
    #[sea_orm(string_value = "intermediate")]
    Intermediate,
    #[sea_orm(string_value = "advanced")]
    Advanced,
}

/// One entry of a tutorial's ordered resource list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    pub url: String,
    /// Free-form label such as "article", "repo" or "video".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tutorial")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author profile ID
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(indexed)]
    pub category: Category,

    #[sea_orm(indexed)]
    pub difficulty: Difficulty,

    #[sea_orm(nullable)]
    pub thumbnail_url: Option<String>,

    #[sea_orm(nullable)]
    pub video_url: Option<String>,

    /// Ordered list of [`Resource`] items
    #[sea_orm(column_type = "JsonBinary")]
    pub resources: Json,

    /// Like count (maintained by the counter path, never written directly)
    #[sea_orm(default_value = 0)]
    pub likes_count: i32,

    /// Comment count (maintained by the counter path)
    #[sea_orm(default_value = 0)]
    pub comments_count: i32,

    /// Enrollment count (maintained by the counter path)
    #[sea_orm(default_value = 0)]
    pub enrollments_count: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Decode the resource list, dropping malformed entries.
    #[must_use]
    pub fn resource_list(&self) -> Vec<Resource> {
        serde_json::from_value(self.resources.clone()).unwrap_or_default()
    }
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
    #[sea_orm(has_many = "super::tutorial_like::Entity")]
    Likes,
    #[sea_orm(has_many = "super::tutorial_comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::tutorial_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl Related<super::tutorial_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
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
            self.updated_at = Set(now);
        }
        Ok(self)
    }
}
