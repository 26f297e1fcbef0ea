//! Enrollment repository.
//!
//! Enrollments are private: every read takes the caller's context and only
//! returns the caller's own rows.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tutorhub_common::{AppError, AppResult, AuthContext};

use super::insert_error;
use crate::counters::{self, Counter};
use crate::entities::{Enrollment, enrollment};
use crate::policy::{Operation, Table, authorize};

/// Enrollment repository for database operations.
#[derive(Clone)]
pub struct EnrollmentRepository {
    db: Arc<DatabaseConnection>,
}

impl EnrollmentRepository {
    /// Create a new enrollment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The caller's enrollment in a tutorial, if any.
    pub async fn find_mine(
        &self,
        ctx: &AuthContext,
        tutorial_id: &str,
    ) -> AppResult<Option<enrollment::Model>> {
        authorize(Some(ctx), Table::Enrollment, Operation::Read, &ctx.identity_id)?;

        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(&ctx.identity_id))
            .filter(enrollment::Column::TutorialId.eq(tutorial_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The caller's enrollments, newest first.
    pub async fn find_mine_paginated(
        &self,
        ctx: &AuthContext,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<enrollment::Model>> {
        authorize(Some(ctx), Table::Enrollment, Operation::Read, &ctx.identity_id)?;

        Enrollment::find()
            .filter(enrollment::Column::UserId.eq(&ctx.identity_id))
            .order_by_desc(enrollment::Column::CreatedAt)
            .order_by_desc(enrollment::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Enroll the caller in a tutorial.
    ///
    /// Returns `Conflict` if already enrolled and `NotFound` if the tutorial
    /// does not exist.
    pub async fn create(
        &self,
        ctx: &AuthContext,
        id: &str,
        tutorial_id: &str,
    ) -> AppResult<enrollment::Model> {
        authorize(Some(ctx), Table::Enrollment, Operation::Insert, &ctx.identity_id)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = enrollment::ActiveModel {
            id: Set(id.to_string()),
            tutorial_id: Set(tutorial_id.to_string()),
            user_id: Set(ctx.identity_id.clone()),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(|e| insert_error(e, "Already enrolled in this tutorial"))?;

        counters::increment(&txn, &row.tutorial_id, Counter::Enrollments).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row)
    }

    /// Withdraw the caller from a tutorial. Returns whether a row was removed.
    pub async fn delete(&self, ctx: &AuthContext, tutorial_id: &str) -> AppResult<bool> {
        authorize(Some(ctx), Table::Enrollment, Operation::Delete, &ctx.identity_id)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = Enrollment::delete_many()
            .filter(enrollment::Column::UserId.eq(&ctx.identity_id))
            .filter(enrollment::Column::TutorialId.eq(tutorial_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let removed = result.rows_affected > 0;
        if removed {
            counters::decrement(&txn, tutorial_id, Counter::Enrollments).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(removed)
    }

    pub(crate) async fn purge_user<C>(conn: &C, user_id: &str) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let rows = Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut removed = 0;
        for row in rows {
            let result = Enrollment::delete_by_id(row.id.as_str())
                .exec(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            if result.rows_affected > 0 {
                counters::decrement(conn, &row.tutorial_id, Counter::Enrollments).await?;
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

    async fn setup() -> (Arc<DatabaseConnection>, EnrollmentRepository) {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = Arc::new(db.conn);
        seed_identity(conn.as_ref(), "alice", "Alice").await.unwrap();
        seed_identity(conn.as_ref(), "bob", "Bob").await.unwrap();
        seed_tutorial(conn.as_ref(), "t1", "alice").await.unwrap();
        (Arc::clone(&conn), EnrollmentRepository::new(conn))
    }

    async fn enrollments_count(conn: &DatabaseConnection) -> i32 {
        Tutorial::find_by_id("t1")
            .one(conn)
            .await
            .unwrap()
            .unwrap()
            .enrollments_count
    }

    #[tokio::test]
    async fn test_enroll_twice_is_rejected() {
        let (conn, repo) = setup().await;
        let bob = AuthContext::new("bob", "token-bob");

        repo.create(&bob, "e1", "t1").await.unwrap();
        let second = repo.create(&bob, "e2", "t1").await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert_eq!(enrollments_count(&conn).await, 1);
    }

    #[tokio::test]
    async fn test_unenroll_decrements_once() {
        let (conn, repo) = setup().await;
        let bob = AuthContext::new("bob", "token-bob");

        repo.create(&bob, "e1", "t1").await.unwrap();
        assert!(repo.delete(&bob, "t1").await.unwrap());
        assert!(!repo.delete(&bob, "t1").await.unwrap());
        assert_eq!(enrollments_count(&conn).await, 0);
    }

    #[tokio::test]
    async fn test_enrollments_invisible_to_others() {
        let (_, repo) = setup().await;
        let bob = AuthContext::new("bob", "token-bob");
        let alice = AuthContext::new("alice", "token-alice");

        repo.create(&bob, "e1", "t1").await.unwrap();

        assert!(repo.find_mine(&bob, "t1").await.unwrap().is_some());
        assert!(repo.find_mine(&alice, "t1").await.unwrap().is_none());
        assert_eq!(repo.find_mine_paginated(&alice, 10, 0).await.unwrap().len(), 0);
    }
}
