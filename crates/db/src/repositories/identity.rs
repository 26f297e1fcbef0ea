//! Identity repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, Set, TransactionTrait,
};
use tracing::info;
use tutorhub_common::{AppError, AppResult, AuthContext};

use super::{comment::CommentRepository, enrollment::EnrollmentRepository, like::LikeRepository};
use super::{insert_error, required};
use crate::entities::{Identity, identity, profile};
use crate::policy::{Operation, Table, authorize};

/// Display name given to a profile when sign-up supplied none.
pub const DEFAULT_FULL_NAME: &str = "Anonymous";

/// Identity repository for database operations.
#[derive(Clone)]
pub struct IdentityRepository {
    db: Arc<DatabaseConnection>,
}

impl IdentityRepository {
    /// Create a new identity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an identity by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<identity::Model>> {
        Identity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an identity by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<identity::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Identity not found: {id}")))
    }

    /// Find an identity by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<identity::Model>> {
        Identity::find()
            .filter(identity::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an identity by its bearer token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<identity::Model>> {
        Identity::find()
            .filter(identity::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an identity together with its profile.
    ///
    /// Runs with system privilege: the policy forbids callers from inserting
    /// either row, so this is the only way a profile comes into existence.
    pub async fn create_with_profile(
        &self,
        model: identity::ActiveModel,
        full_name: Option<&str>,
    ) -> AppResult<(identity::Model, profile::Model)> {
        let mut model = model;
        let email = required(&model.email, "email")?.trim().to_lowercase();
        model.email = Set(email);

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let identity = model
            .insert(&txn)
            .await
            .map_err(|e| insert_error(e, "Email is already registered"))?;
        let profile = bootstrap_profile(&txn, &identity, full_name).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(identity_id = %identity.id, "Created identity and profile");
        Ok((identity, profile))
    }

    /// Store a bearer token on an identity.
    ///
    /// System path used by sign-in once the password has been verified.
    pub async fn issue_token(&self, id: &str, token: &str) -> AppResult<identity::Model> {
        let mut active = self.get_by_id(id).await?.into_active_model();
        active.token = Set(Some(token.to_string()));
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| insert_error(e, "Token collision"))
    }

    /// Clear the caller's bearer token.
    pub async fn revoke_token(&self, ctx: &AuthContext) -> AppResult<()> {
        let identity = self.get_by_id(&ctx.identity_id).await?;
        authorize(Some(ctx), Table::Identity, Operation::Update, &identity.id)?;

        let mut active = identity.into_active_model();
        active.token = Set(None);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete an identity and everything it owns.
    ///
    /// The caller's likes, comments and enrollments go through the counter
    /// path first so tutorials owned by other users keep exact counts. The
    /// profile, its tutorials and their children are removed by cascade.
    pub async fn delete(&self, ctx: &AuthContext, id: &str) -> AppResult<()> {
        let identity = self.get_by_id(id).await?;
        authorize(Some(ctx), Table::Identity, Operation::Delete, &identity.id)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let likes = LikeRepository::purge_user(&txn, id).await?;
        let comments = CommentRepository::purge_user(&txn, id).await?;
        let enrollments = EnrollmentRepository::purge_user(&txn, id).await?;

        Identity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            identity_id = %id,
            likes,
            comments,
            enrollments,
            "Deleted identity"
        );
        Ok(())
    }
}

/// Display name for a new profile: the trimmed input, or the default.
#[must_use]
pub fn bootstrap_full_name(full_name: Option<&str>) -> String {
    full_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FULL_NAME)
        .to_string()
}

async fn bootstrap_profile<C>(
    conn: &C,
    identity: &identity::Model,
    full_name: Option<&str>,
) -> AppResult<profile::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now().fixed_offset();
    profile::ActiveModel {
        id: Set(identity.id.clone()),
        full_name: Set(bootstrap_full_name(full_name)),
        bio: Set(None),
        avatar_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(|e| insert_error(e, "Profile already exists"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::{Profile, Tutorial, TutorialComment, TutorialLike};
    use crate::test_utils::{TestDatabase, seed_identity, seed_tutorial};
    use sea_orm::PaginatorTrait;

    fn new_identity(id: &str, email: &str) -> identity::ActiveModel {
        identity::ActiveModel {
            id: Set(id.to_string()),
            email: Set(email.to_string()),
            password_hash: Set("hash".to_string()),
            token: Set(None),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        }
    }

    #[test]
    fn test_bootstrap_full_name() {
        assert_eq!(bootstrap_full_name(Some("  Ada  ")), "Ada");
        assert_eq!(bootstrap_full_name(Some("   ")), DEFAULT_FULL_NAME);
        assert_eq!(bootstrap_full_name(None), DEFAULT_FULL_NAME);
    }

    #[tokio::test]
    async fn test_create_with_profile_creates_exactly_one_profile() {
        let db = TestDatabase::in_memory().await.unwrap();
        let repo = IdentityRepository::new(Arc::new(db.conn));

        let (identity, profile) = repo
            .create_with_profile(new_identity("ada", "Ada@Example.com"), Some("Ada"))
            .await
            .unwrap();

        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(profile.id, identity.id);
        assert_eq!(profile.full_name, "Ada");
        assert!(profile.bio.is_none());

        let (_, anon) = repo
            .create_with_profile(new_identity("anon", "anon@example.com"), None)
            .await
            .unwrap();
        assert_eq!(anon.full_name, DEFAULT_FULL_NAME);

        let count = Profile::find().count(repo.db.as_ref()).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict_and_creates_no_profile() {
        let db = TestDatabase::in_memory().await.unwrap();
        let repo = IdentityRepository::new(Arc::new(db.conn));

        repo.create_with_profile(new_identity("a", "same@example.com"), None)
            .await
            .unwrap();
        let result = repo
            .create_with_profile(new_identity("b", "SAME@example.com"), None)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        assert!(Profile::find_by_id("b").one(repo.db.as_ref()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let db = TestDatabase::in_memory().await.unwrap();
        let repo = IdentityRepository::new(Arc::new(db.conn));
        repo.create_with_profile(new_identity("ada", "ada@example.com"), None)
            .await
            .unwrap();

        repo.issue_token("ada", "tok").await.unwrap();
        let found = repo.find_by_token("tok").await.unwrap().unwrap();
        assert_eq!(found.id, "ada");

        repo.revoke_token(&AuthContext::new("ada", "tok")).await.unwrap();
        assert!(repo.find_by_token("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_self() {
        let db = TestDatabase::in_memory().await.unwrap();
        seed_identity(&db.conn, "alice", "Alice").await.unwrap();
        let repo = IdentityRepository::new(Arc::new(db.conn));

        let result = repo.delete(&AuthContext::new("bob", "t"), "alice").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(repo.find_by_id("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_cascades_and_keeps_other_counters_exact() {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = Arc::new(db.conn);
        seed_identity(conn.as_ref(), "alice", "Alice").await.unwrap();
        seed_identity(conn.as_ref(), "bob", "Bob").await.unwrap();
        seed_tutorial(conn.as_ref(), "alice-t", "alice").await.unwrap();
        seed_tutorial(conn.as_ref(), "bob-t", "bob").await.unwrap();

        let likes = LikeRepository::new(Arc::clone(&conn));
        let comments = CommentRepository::new(Arc::clone(&conn));
        let bob = AuthContext::new("bob", "token-bob");
        let alice = AuthContext::new("alice", "token-alice");

        likes.create(&bob, "l1", "alice-t").await.unwrap();
        comments.create(&bob, "c1", "alice-t", "hi").await.unwrap();
        comments.create(&alice, "c2", "alice-t", "thanks").await.unwrap();
        likes.create(&alice, "l2", "bob-t").await.unwrap();

        let repo = IdentityRepository::new(Arc::clone(&conn));
        repo.delete(&bob, "bob").await.unwrap();

        let t = Tutorial::find_by_id("alice-t")
            .one(conn.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(t.likes_count, 0);
        assert_eq!(t.comments_count, 1);

        // Bob's tutorial and the like on it are gone
        assert!(Tutorial::find_by_id("bob-t").one(conn.as_ref()).await.unwrap().is_none());
        assert_eq!(TutorialLike::find().count(conn.as_ref()).await.unwrap(), 0);
        assert_eq!(TutorialComment::find().count(conn.as_ref()).await.unwrap(), 1);
        assert!(Profile::find_by_id("bob").one(conn.as_ref()).await.unwrap().is_none());
    }
}
