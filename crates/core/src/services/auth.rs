//! Sign-up, sign-in and session service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tutorhub_common::{AppError, AppResult, AuthContext, IdGenerator};
use tutorhub_db::{
    entities::identity,
    repositories::{IdentityRepository, ProfileRepository},
};
use validator::Validate;

use super::profile::ProfileResponse;

/// Input for creating an account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, max = 128))]
    pub password: String,

    #[validate(length(max = 100))]
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Input for signing in.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignInInput {
    #[validate(length(min = 1))]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// A signed-in session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub identity_id: String,
    pub email: String,
    pub profile: ProfileResponse,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    identity_repo: IdentityRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub const fn new(identity_repo: IdentityRepository, profile_repo: ProfileRepository) -> Self {
        Self {
            identity_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an account and its profile, returning a session.
    pub async fn sign_up(&self, input: SignUpInput) -> AppResult<SessionResponse> {
        let mut input = input;
        input.email = input.email.trim().to_lowercase();
        input.validate()?;

        if self.identity_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let token = self.id_gen.generate_token();

        let model = identity::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email),
            password_hash: Set(password_hash),
            token: Set(Some(token.clone())),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        };

        let (identity, profile) = self
            .identity_repo
            .create_with_profile(model, input.full_name.as_deref())
            .await?;

        info!(identity_id = %identity.id, "Signed up");

        Ok(SessionResponse {
            token,
            identity_id: identity.id,
            email: identity.email,
            profile: profile.into(),
        })
    }

    /// Verify credentials and return a session.
    ///
    /// Wrong email and wrong password are indistinguishable to the caller.
    pub async fn sign_in(&self, input: SignInInput) -> AppResult<SessionResponse> {
        input.validate()?;

        let identity = self
            .identity_repo
            .find_by_email(&input.email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &identity.password_hash)? {
            debug!(identity_id = %identity.id, "Rejected sign-in");
            return Err(AppError::Unauthorized);
        }

        let identity = match identity.token {
            Some(_) => identity,
            None => {
                let token = self.id_gen.generate_token();
                self.identity_repo.issue_token(&identity.id, &token).await?
            }
        };
        let token = identity
            .token
            .clone()
            .ok_or_else(|| AppError::Internal("Token was not issued".to_string()))?;

        let profile = self.profile_repo.get_by_id(&identity.id).await?;

        Ok(SessionResponse {
            token,
            identity_id: identity.id,
            email: identity.email,
            profile: profile.into(),
        })
    }

    /// Revoke the caller's token. Every session sharing it ends.
    pub async fn sign_out(&self, ctx: &AuthContext) -> AppResult<()> {
        self.identity_repo.revoke_token(ctx).await
    }

    /// Resolve a bearer token into a session.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<AuthContext> {
        let identity = self
            .identity_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(AuthContext::new(identity.id, token))
    }

    /// Delete the caller's account and everything it owns.
    pub async fn delete_account(&self, ctx: &AuthContext) -> AppResult<()> {
        self.identity_repo.delete(ctx, &ctx.identity_id).await
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tutorhub_db::repositories::DEFAULT_FULL_NAME;
    use tutorhub_db::test_utils::TestDatabase;

    async fn service() -> AuthService {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = Arc::new(db.conn);
        AuthService::new(
            IdentityRepository::new(Arc::clone(&conn)),
            ProfileRepository::new(conn),
        )
    }

    fn sign_up_input(email: &str, full_name: Option<&str>) -> SignUpInput {
        SignUpInput {
            email: email.to_string(),
            password: "hunter22".to_string(),
            full_name: full_name.map(ToString::to_string),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("secret123").unwrap();
        assert_ne!(hash, "secret123");
        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
        assert!(verify_password("x", "invalid_hash").is_err());
    }

    #[test]
    fn test_sign_up_input_validation() {
        let mut input = sign_up_input("not-an-email", None);
        assert!(input.validate().is_err());

        input.email = "ada@example.com".to_string();
        input.password = "12345".to_string();
        assert!(input.validate().is_err());

        input.password = "123456".to_string();
        assert!(input.validate().is_ok());
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile_with_name_or_default() {
        let service = service().await;

        let named = service
            .sign_up(sign_up_input("ada@example.com", Some(" Ada ")))
            .await
            .unwrap();
        assert_eq!(named.profile.full_name, "Ada");
        assert_eq!(named.profile.id, named.identity_id);

        let anon = service
            .sign_up(sign_up_input("anon@example.com", None))
            .await
            .unwrap();
        assert_eq!(anon.profile.full_name, DEFAULT_FULL_NAME);
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email() {
        let service = service().await;
        service
            .sign_up(sign_up_input("ada@example.com", None))
            .await
            .unwrap();
        let result = service
            .sign_up(sign_up_input("ADA@example.com", None))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_sign_in_sign_out_cycle() {
        let service = service().await;
        let session = service
            .sign_up(sign_up_input("ada@example.com", None))
            .await
            .unwrap();

        let ctx = service.authenticate_by_token(&session.token).await.unwrap();
        assert_eq!(ctx.identity_id, session.identity_id);

        let wrong = service
            .sign_in(SignInInput {
                email: "ada@example.com".to_string(),
                password: "nope-nope".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(AppError::Unauthorized)));

        service.sign_out(&ctx).await.unwrap();
        assert!(matches!(
            service.authenticate_by_token(&session.token).await,
            Err(AppError::Unauthorized)
        ));

        let again = service
            .sign_in(SignInInput {
                email: "Ada@Example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();
        assert_ne!(again.token, session.token);
        assert!(service.authenticate_by_token(&again.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_account() {
        let service = service().await;
        let session = service
            .sign_up(sign_up_input("ada@example.com", None))
            .await
            .unwrap();
        let ctx = service.authenticate_by_token(&session.token).await.unwrap();

        service.delete_account(&ctx).await.unwrap();
        assert!(service.authenticate_by_token(&session.token).await.is_err());
    }
}
