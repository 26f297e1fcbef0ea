//! Tutorial comment repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tutorhub_common::{AppError, AppResult, AuthContext};

use super::insert_error;
use crate::counters::{self, Counter};
use crate::entities::{TutorialComment, tutorial_comment};
use crate::policy::{Operation, Table, authorize};

/// Tutorial comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tutorial_comment::Model>> {
        TutorialComment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<tutorial_comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment not found: {id}")))
    }

    /// Comments on a tutorial, oldest first.
    pub async fn find_by_tutorial(
        &self,
        tutorial_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<tutorial_comment::Model>> {
        TutorialComment::find()
            .filter(tutorial_comment::Column::TutorialId.eq(tutorial_id))
            .order_by_asc(tutorial_comment::Column::CreatedAt)
            .order_by_asc(tutorial_comment::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on a tutorial.
    pub async fn count_by_tutorial(&self, tutorial_id: &str) -> AppResult<u64> {
        TutorialComment::find()
            .filter(tutorial_comment::Column::TutorialId.eq(tutorial_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Post a comment as the caller and bump the tutorial's comment count.
    pub async fn create(
        &self,
        ctx: &AuthContext,
        id: &str,
        tutorial_id: &str,
        content: &str,
    ) -> AppResult<tutorial_comment::Model> {
        authorize(Some(ctx), Table::TutorialComment, Operation::Insert, &ctx.identity_id)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let comment = tutorial_comment::ActiveModel {
            id: Set(id.to_string()),
            tutorial_id: Set(tutorial_id.to_string()),
            user_id: Set(ctx.identity_id.clone()),
            content: Set(content.to_string()),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(|e| insert_error(e, "Duplicate comment ID"))?;

        counters::increment(&txn, &comment.tutorial_id, Counter::Comments).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(comment)
    }

    /// Delete one of the caller's comments.
    pub async fn delete(&self, ctx: &AuthContext, id: &str) -> AppResult<()> {
        let comment = self.get_by_id(id).await?;
        authorize(Some(ctx), Table::TutorialComment, Operation::Delete, &comment.user_id)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = TutorialComment::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // A concurrent delete may have won; only the winner decrements
        if result.rows_affected > 0 {
            counters::decrement(&txn, &comment.tutorial_id, Counter::Comments).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    pub(crate) async fn purge_user<C>(conn: &C, user_id: &str) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let comments = TutorialComment::find()
            .filter(tutorial_comment::Column::UserId.eq(user_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut removed = 0;
        for comment in comments {
            let result = TutorialComment::delete_by_id(comment.id.as_str())
                .exec(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            if result.rows_affected > 0 {
                counters::decrement(conn, &comment.tutorial_id, Counter::Comments).await?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::Tutorial;
    use crate::test_utils::{TestDatabase, seed_identity, seed_tutorial};

    async fn setup() -> (Arc<DatabaseConnection>, CommentRepository) {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = Arc::new(db.conn);
        seed_identity(conn.as_ref(), "alice", "Alice").await.unwrap();
        seed_identity(conn.as_ref(), "bob", "Bob").await.unwrap();
        seed_tutorial(conn.as_ref(), "t1", "alice").await.unwrap();
        (Arc::clone(&conn), CommentRepository::new(conn))
    }

    async fn comments_count(conn: &DatabaseConnection) -> i32 {
        Tutorial::find_by_id("t1")
            .one(conn)
            .await
            .unwrap()
            .unwrap()
            .comments_count
    }

    #[tokio::test]
    async fn test_multiple_comments_per_user_are_counted() {
        let (conn, repo) = setup().await;
        let bob = AuthContext::new("bob", "token-bob");

        repo.create(&bob, "c1", "t1", "first").await.unwrap();
        repo.create(&bob, "c2", "t1", "second").await.unwrap();
        assert_eq!(comments_count(&conn).await, 2);

        let listed = repo.find_by_tutorial("t1", 10, 0).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "c1");
    }

    #[tokio::test]
    async fn test_only_author_can_delete() {
        let (conn, repo) = setup().await;
        let bob = AuthContext::new("bob", "token-bob");
        let alice = AuthContext::new("alice", "token-alice");

        repo.create(&bob, "c1", "t1", "hello").await.unwrap();

        let result = repo.delete(&alice, "c1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(comments_count(&conn).await, 1);

        repo.delete(&bob, "c1").await.unwrap();
        assert_eq!(comments_count(&conn).await, 0);

        let again = repo.delete(&bob, "c1").await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
        assert_eq!(comments_count(&conn).await, 0);
    }

    #[tokio::test]
    async fn test_deleting_tutorial_removes_comments() {
        let (conn, repo) = setup().await;
        let bob = AuthContext::new("bob", "token-bob");
        repo.create(&bob, "c1", "t1", "hello").await.unwrap();

        Tutorial::delete_by_id("t1").exec(conn.as_ref()).await.unwrap();

        assert_eq!(repo.count_by_tutorial("t1").await.unwrap(), 0);
        assert!(repo.find_by_id("c1").await.unwrap().is_none());
    }
}
