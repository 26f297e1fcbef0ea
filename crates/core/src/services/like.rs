//! Tutorial like service.

use tracing::debug;
use tutorhub_common::{AppError, AppResult, AuthContext, IdGenerator};
use tutorhub_db::repositories::{LikeRepository, ProfileRepository, TutorialRepository};

use super::tutorial::{
    DEFAULT_BROWSE_LIMIT, MAX_BROWSE_LIMIT, TutorialResponse, in_order, with_authors,
};
use crate::validation::clamp_limit;

/// Service for liking tutorials.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    tutorial_repo: TutorialRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        like_repo: LikeRepository,
        tutorial_repo: TutorialRepository,
        profile_repo: ProfileRepository,
    ) -> Self {
        Self {
            like_repo,
            tutorial_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Like a tutorial. Returns `false` if the caller already liked it.
    pub async fn like(&self, ctx: &AuthContext, tutorial_id: &str) -> AppResult<bool> {
        match self
            .like_repo
            .create(ctx, &self.id_gen.generate(), tutorial_id)
            .await
        {
            Ok(_) => Ok(true),
            Err(AppError::Conflict(_)) => {
                debug!(tutorial_id = %tutorial_id, user_id = %ctx.identity_id, "Already liked");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Remove the caller's like. Returns `false` if there was none.
    pub async fn unlike(&self, ctx: &AuthContext, tutorial_id: &str) -> AppResult<bool> {
        let removed = self.like_repo.delete(ctx, tutorial_id).await?;
        if !removed {
            debug!(tutorial_id = %tutorial_id, user_id = %ctx.identity_id, "Nothing to unlike");
        }
        Ok(removed)
    }

    /// Flip the caller's like. Returns whether the tutorial is now liked.
    pub async fn toggle(&self, ctx: &AuthContext, tutorial_id: &str) -> AppResult<bool> {
        if self.unlike(ctx, tutorial_id).await? {
            Ok(false)
        } else {
            self.like(ctx, tutorial_id).await?;
            Ok(true)
        }
    }

    /// Whether the caller likes a tutorial.
    pub async fn is_liked(&self, ctx: &AuthContext, tutorial_id: &str) -> AppResult<bool> {
        self.like_repo.exists(&ctx.identity_id, tutorial_id).await
    }

    /// Tutorials the caller liked, most recently liked first.
    pub async fn liked_by(
        &self,
        ctx: &AuthContext,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> AppResult<Vec<TutorialResponse>> {
        let limit = clamp_limit(limit, DEFAULT_BROWSE_LIMIT, MAX_BROWSE_LIMIT);
        let likes = self
            .like_repo
            .find_by_user(&ctx.identity_id, limit, offset.unwrap_or(0))
            .await?;

        let ids: Vec<String> = likes.into_iter().map(|l| l.tutorial_id).collect();
        let tutorials = self.tutorial_repo.find_by_ids(&ids).await?;
        with_authors(&self.profile_repo, in_order(&ids, tutorials)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tutorhub_db::test_utils::{TestDatabase, seed_identity, seed_tutorial};

    async fn service() -> (LikeService, TutorialRepository) {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = Arc::new(db.conn);
        seed_identity(conn.as_ref(), "alice", "Alice").await.unwrap();
        seed_identity(conn.as_ref(), "bob", "Bob").await.unwrap();
        seed_tutorial(conn.as_ref(), "t1", "alice").await.unwrap();
        seed_tutorial(conn.as_ref(), "t2", "alice").await.unwrap();

        let tutorials = TutorialRepository::new(Arc::clone(&conn));
        let service = LikeService::new(
            LikeRepository::new(Arc::clone(&conn)),
            tutorials.clone(),
            ProfileRepository::new(conn),
        );
        (service, tutorials)
    }

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let (service, tutorials) = service().await;
        let bob = AuthContext::new("bob", "t");

        assert!(service.like(&bob, "t1").await.unwrap());
        assert!(!service.like(&bob, "t1").await.unwrap());
        assert_eq!(tutorials.get_by_id("t1").await.unwrap().likes_count, 1);

        assert!(service.unlike(&bob, "t1").await.unwrap());
        assert!(!service.unlike(&bob, "t1").await.unwrap());
        assert_eq!(tutorials.get_by_id("t1").await.unwrap().likes_count, 0);
    }

    #[tokio::test]
    async fn test_toggle() {
        let (service, tutorials) = service().await;
        let bob = AuthContext::new("bob", "t");

        assert!(service.toggle(&bob, "t1").await.unwrap());
        assert!(service.is_liked(&bob, "t1").await.unwrap());
        assert!(!service.toggle(&bob, "t1").await.unwrap());
        assert!(!service.is_liked(&bob, "t1").await.unwrap());
        assert_eq!(tutorials.get_by_id("t1").await.unwrap().likes_count, 0);
    }

    #[tokio::test]
    async fn test_owner_may_like_own_tutorial() {
        let (service, tutorials) = service().await;
        assert!(service.like(&AuthContext::new("alice", "t"), "t1").await.unwrap());
        assert_eq!(tutorials.get_by_id("t1").await.unwrap().likes_count, 1);
    }

    #[tokio::test]
    async fn test_liked_by_lists_tutorials_with_authors() {
        let (service, _) = service().await;
        let bob = AuthContext::new("bob", "t");
        service.like(&bob, "t1").await.unwrap();
        service.like(&bob, "t2").await.unwrap();

        let liked = service.liked_by(&bob, None, None).await.unwrap();
        assert_eq!(liked.len(), 2);
        assert!(liked.iter().all(|t| t.author.as_ref().unwrap().full_name == "Alice"));

        let none = service
            .liked_by(&AuthContext::new("alice", "t"), None, None)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_like_missing_tutorial() {
        let (service, _) = service().await;
        let result = service.like(&AuthContext::new("bob", "t"), "missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
