//! Profile service.

use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tutorhub_common::{AppResult, AuthContext};
use tutorhub_db::{entities::profile, repositories::ProfileRepository};
use validator::Validate;

use crate::validation::{normalize_optional, trim_in_place, validate_http_url};

/// Public view of a profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<profile::Model> for ProfileResponse {
    fn from(p: profile::Model) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name,
            bio: p.bio,
            avatar_url: p.avatar_url,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Input for updating a profile. Absent fields are left unchanged; an empty
/// `bio` or `avatarUrl` clears the field.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(length(max = 512), custom(function = "validate_http_url"))]
    pub avatar_url: Option<String>,
}

/// Profile service for business logic.
#[derive(Clone)]
pub struct ProfileService {
    profile_repo: ProfileRepository,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository) -> Self {
        Self { profile_repo }
    }

    /// Get a profile by ID.
    pub async fn get(&self, id: &str) -> AppResult<ProfileResponse> {
        Ok(self.profile_repo.get_by_id(id).await?.into())
    }

    /// Update the caller's profile.
    pub async fn update(
        &self,
        ctx: &AuthContext,
        id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<ProfileResponse> {
        let mut input = input;
        if let Some(name) = input.full_name.as_mut() {
            trim_in_place(name);
        }
        let clear_bio = input.bio.as_deref().is_some_and(|b| b.trim().is_empty());
        let clear_avatar = input.avatar_url.as_deref().is_some_and(|u| u.trim().is_empty());
        input.bio = normalize_optional(input.bio);
        input.avatar_url = normalize_optional(input.avatar_url);
        input.validate()?;

        let mut model = profile::ActiveModel {
            id: Set(id.to_string()),
            ..Default::default()
        };
        if let Some(name) = input.full_name {
            model.full_name = Set(name);
        }
        if clear_bio {
            model.bio = Set(None);
        } else if let Some(bio) = input.bio {
            model.bio = Set(Some(bio));
        }
        if clear_avatar {
            model.avatar_url = Set(None);
        } else if let Some(url) = input.avatar_url {
            model.avatar_url = Set(Some(url));
        }

        Ok(self.profile_repo.update(ctx, model).await?.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tutorhub_common::AppError;
    use tutorhub_db::test_utils::{TestDatabase, seed_identity};

    async fn service() -> ProfileService {
        let db = TestDatabase::in_memory().await.unwrap();
        seed_identity(&db.conn, "alice", "Alice").await.unwrap();
        ProfileService::new(ProfileRepository::new(Arc::new(db.conn)))
    }

    #[test]
    fn test_update_input_validation() {
        let input = UpdateProfileInput {
            full_name: Some(String::new()),
            ..Default::default()
        };
        assert!(input.validate().is_err());

        let input = UpdateProfileInput {
            avatar_url: Some("ftp://example.com/a.png".to_string()),
            ..Default::default()
        };
        assert!(input.validate().is_err());

        let input = UpdateProfileInput {
            bio: Some("x".repeat(501)),
            ..Default::default()
        };
        assert!(input.validate().is_err());

        let input = UpdateProfileInput {
            avatar_url: Some(format!("https://example.com/{}.png", "a".repeat(500))),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn test_update_and_clear_fields() {
        let service = service().await;
        let alice = AuthContext::new("alice", "t");

        let updated = service
            .update(
                &alice,
                "alice",
                UpdateProfileInput {
                    full_name: Some("  Alice L. ".to_string()),
                    bio: Some("Teaches Rust".to_string()),
                    avatar_url: Some("https://example.com/a.png".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Alice L.");
        assert_eq!(updated.bio.as_deref(), Some("Teaches Rust"));

        let cleared = service
            .update(
                &alice,
                "alice",
                UpdateProfileInput {
                    bio: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.bio.is_none());
        assert_eq!(cleared.full_name, "Alice L.");
        assert!(cleared.avatar_url.is_some());
    }

    #[tokio::test]
    async fn test_update_blank_name_is_rejected() {
        let service = service().await;
        let result = service
            .update(
                &AuthContext::new("alice", "t"),
                "alice",
                UpdateProfileInput {
                    full_name: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_someone_else_is_forbidden() {
        let service = service().await;
        let result = service
            .update(
                &AuthContext::new("bob", "t"),
                "alice",
                UpdateProfileInput {
                    full_name: Some("Bob".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_missing_profile() {
        let service = service().await;
        assert!(matches!(service.get("nobody").await, Err(AppError::NotFound(_))));
    }
}
