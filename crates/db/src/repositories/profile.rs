//! Profile repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tutorhub_common::{AppError, AppResult, AuthContext};

use super::required;
use crate::entities::{Profile, profile};
use crate::policy::{Operation, Table, authorize};

/// Profile repository for database operations.
///
/// There is no insert or delete here: profiles are created by the identity
/// bootstrap and removed by cascade.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a profile by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a profile by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<profile::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile not found: {id}")))
    }

    /// Find profiles by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<profile::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Profile::find()
            .filter(profile::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update the caller's own profile.
    ///
    /// `updated_at` is always refreshed by the entity, whatever the model says.
    pub async fn update(
        &self,
        ctx: &AuthContext,
        model: profile::ActiveModel,
    ) -> AppResult<profile::Model> {
        let id = required(&model.id, "id")?.to_string();
        let existing = self.get_by_id(&id).await?;
        authorize(Some(ctx), Table::Profile, Operation::Update, &existing.id)?;

        let mut model = model;
        model.id = ActiveValue::Unchanged(existing.id);
        model.created_at = ActiveValue::NotSet;

        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{TestDatabase, seed_identity};
    use chrono::{Duration, Utc};
    use sea_orm::Set;

    #[tokio::test]
    async fn test_update_own_profile_refreshes_updated_at() {
        let db = TestDatabase::in_memory().await.unwrap();
        let before = seed_identity(&db.conn, "alice", "Alice").await.unwrap();
        let repo = ProfileRepository::new(Arc::new(db.conn));

        let stale = (Utc::now() - Duration::days(30)).fixed_offset();
        let updated = repo
            .update(
                &AuthContext::new("alice", "t"),
                profile::ActiveModel {
                    id: Set("alice".to_string()),
                    bio: Set(Some("Teaches Rust".to_string())),
                    updated_at: Set(stale),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.bio.as_deref(), Some("Teaches Rust"));
        assert_eq!(updated.full_name, "Alice");
        assert!(updated.updated_at >= before.updated_at);
        assert!(updated.updated_at > stale);
    }

    #[tokio::test]
    async fn test_update_other_profile_is_forbidden() {
        let db = TestDatabase::in_memory().await.unwrap();
        seed_identity(&db.conn, "alice", "Alice").await.unwrap();
        let repo = ProfileRepository::new(Arc::new(db.conn));

        let result = repo
            .update(
                &AuthContext::new("bob", "t"),
                profile::ActiveModel {
                    id: Set("alice".to_string()),
                    full_name: Set("Mallory".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(repo.get_by_id("alice").await.unwrap().full_name, "Alice");
    }

    #[tokio::test]
    async fn test_find_by_ids() {
        let db = TestDatabase::in_memory().await.unwrap();
        seed_identity(&db.conn, "alice", "Alice").await.unwrap();
        seed_identity(&db.conn, "bob", "Bob").await.unwrap();
        let repo = ProfileRepository::new(Arc::new(db.conn));

        let found = repo
            .find_by_ids(&["alice".to_string(), "nobody".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }
}
