//! Identity entity (sign-in credentials and session token).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An account known to the identity layer. Each identity owns exactly one
/// profile, created alongside it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "identity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Sign-in email, stored lowercase.
    #[sea_orm(unique)]
    pub email: String,

    /// Password hash (Argon2).
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Current bearer token; cleared on sign-out.
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::profile::Entity")]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
