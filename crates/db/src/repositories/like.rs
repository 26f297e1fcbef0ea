//! Tutorial like repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tutorhub_common::{AppError, AppResult, AuthContext};

use super::insert_error;
use crate::counters::{self, Counter};
use crate::entities::{TutorialLike, tutorial_like};
use crate::policy::{Operation, Table, authorize};

/// Repository for tutorial likes. Every insert and delete adjusts
/// `tutorial.likes_count` in the same transaction.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the caller's like on a tutorial.
    pub async fn find(
        &self,
        user_id: &str,
        tutorial_id: &str,
    ) -> AppResult<Option<tutorial_like::Model>> {
        TutorialLike::find()
            .filter(tutorial_like::Column::UserId.eq(user_id))
            .filter(tutorial_like::Column::TutorialId.eq(tutorial_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a user has liked a tutorial.
    pub async fn exists(&self, user_id: &str, tutorial_id: &str) -> AppResult<bool> {
        Ok(self.find(user_id, tutorial_id).await?.is_some())
    }

    /// Like a tutorial as the caller.
    ///
    /// Returns `Conflict` if the caller already likes it and `NotFound` if
    /// the tutorial does not exist.
    pub async fn create(
        &self,
        ctx: &AuthContext,
        id: &str,
        tutorial_id: &str,
    ) -> AppResult<tutorial_like::Model> {
        authorize(Some(ctx), Table::TutorialLike, Operation::Insert, &ctx.identity_id)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let like = tutorial_like::ActiveModel {
            id: Set(id.to_string()),
            tutorial_id: Set(tutorial_id.to_string()),
            user_id: Set(ctx.identity_id.clone()),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(|e| insert_error(e, "Already liked this tutorial"))?;

        counters::increment(&txn, &like.tutorial_id, Counter::Likes).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(like)
    }

    /// Remove the caller's like on a tutorial. Returns whether a row was removed.
    pub async fn delete(&self, ctx: &AuthContext, tutorial_id: &str) -> AppResult<bool> {
        authorize(Some(ctx), Table::TutorialLike, Operation::Delete, &ctx.identity_id)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = TutorialLike::delete_many()
            .filter(tutorial_like::Column::UserId.eq(&ctx.identity_id))
            .filter(tutorial_like::Column::TutorialId.eq(tutorial_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let removed = result.rows_affected > 0;
        if removed {
            counters::decrement(&txn, tutorial_id, Counter::Likes).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(removed)
    }

    /// Likes by a user, newest first.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<tutorial_like::Model>> {
        TutorialLike::find()
            .filter(tutorial_like::Column::UserId.eq(user_id))
            .order_by_desc(tutorial_like::Column::CreatedAt)
            .order_by_desc(tutorial_like::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes on a tutorial.
    pub async fn count_by_tutorial(&self, tutorial_id: &str) -> AppResult<u64> {
        TutorialLike::find()
            .filter(tutorial_like::Column::TutorialId.eq(tutorial_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove every like a user has made, decrementing each tutorial.
    pub(crate) async fn purge_user<C>(conn: &C, user_id: &str) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let likes = TutorialLike::find()
            .filter(tutorial_like::Column::UserId.eq(user_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for like in &likes {
            let result = TutorialLike::delete_by_id(like.id.as_str())
                .exec(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            if result.rows_affected > 0 {
                counters::decrement(conn, &like.tutorial_id, Counter::Likes).await?;
            }
        }

        Ok(likes.len() as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::Tutorial;
    use crate::test_utils::{TestDatabase, seed_identity, seed_tutorial};

    async fn setup() -> (Arc<DatabaseConnection>, LikeRepository) {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = Arc::new(db.conn);
        seed_identity(conn.as_ref(), "alice", "Alice").await.unwrap();
        seed_identity(conn.as_ref(), "bob", "Bob").await.unwrap();
        seed_tutorial(conn.as_ref(), "t1", "alice").await.unwrap();
        (Arc::clone(&conn), LikeRepository::new(conn))
    }

    async fn likes_count(conn: &DatabaseConnection) -> i32 {
        Tutorial::find_by_id("t1")
            .one(conn)
            .await
            .unwrap()
            .unwrap()
            .likes_count
    }

    #[tokio::test]
    async fn test_like_then_unlike_tracks_counter() {
        let (conn, repo) = setup().await;
        let bob = AuthContext::new("bob", "token-bob");

        repo.create(&bob, "l1", "t1").await.unwrap();
        assert_eq!(likes_count(&conn).await, 1);
        assert!(repo.exists("bob", "t1").await.unwrap());

        assert!(repo.delete(&bob, "t1").await.unwrap());
        assert_eq!(likes_count(&conn).await, 0);
        assert!(!repo.exists("bob", "t1").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_like_is_conflict_and_counter_unchanged() {
        let (conn, repo) = setup().await;
        let bob = AuthContext::new("bob", "token-bob");

        repo.create(&bob, "l1", "t1").await.unwrap();
        let result = repo.create(&bob, "l2", "t1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        assert_eq!(likes_count(&conn).await, 1);
        assert_eq!(repo.count_by_tutorial("t1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_repeated_unlike_never_goes_negative() {
        let (conn, repo) = setup().await;
        let bob = AuthContext::new("bob", "token-bob");

        repo.create(&bob, "l1", "t1").await.unwrap();
        assert!(repo.delete(&bob, "t1").await.unwrap());
        assert!(!repo.delete(&bob, "t1").await.unwrap());
        assert!(!repo.delete(&bob, "t1").await.unwrap());

        assert_eq!(likes_count(&conn).await, 0);
    }

    #[tokio::test]
    async fn test_like_missing_tutorial_is_not_found() {
        let (_, repo) = setup().await;
        let result = repo
            .create(&AuthContext::new("bob", "token-bob"), "l1", "nope")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_counter_matches_rows_with_many_users() {
        let (conn, repo) = setup().await;
        seed_identity(conn.as_ref(), "carol", "Carol").await.unwrap();

        for (i, user) in ["alice", "bob", "carol"].into_iter().enumerate() {
            let ctx = AuthContext::new(user, "t");
            repo.create(&ctx, &format!("l{i}"), "t1").await.unwrap();
        }
        repo.delete(&AuthContext::new("bob", "t"), "t1").await.unwrap();

        assert_eq!(likes_count(&conn).await, 2);
        assert_eq!(repo.count_by_tutorial("t1").await.unwrap(), 2);
    }
}
