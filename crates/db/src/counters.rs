//! Denormalized tutorial counters.
//!
//! `likes_count`, `comments_count` and `enrollments_count` are maintained
//! incrementally: the repository that inserts or deletes a child row calls
//! [`increment`] or [`decrement`] on the same transaction. There is no
//! recount path, so every child insert/delete must go through here.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr};
use tutorhub_common::{AppError, AppResult};

use crate::entities::{Tutorial, tutorial};

/// A counter column on the tutorial row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// `tutorial_like` rows.
    Likes,
    /// `tutorial_comment` rows.
    Comments,
    /// `enrollment` rows.
    Enrollments,
}

impl Counter {
    const fn column(self) -> tutorial::Column {
        match self {
            Self::Likes => tutorial::Column::LikesCount,
            Self::Comments => tutorial::Column::CommentsCount,
            Self::Enrollments => tutorial::Column::EnrollmentsCount,
        }
    }

    const fn column_name(self) -> &'static str {
        match self {
            Self::Likes => "likes_count",
            Self::Comments => "comments_count",
            Self::Enrollments => "enrollments_count",
        }
    }

    /// Read this counter from a tutorial row.
    #[must_use]
    pub const fn get(self, tutorial: &tutorial::Model) -> i32 {
        match self {
            Self::Likes => tutorial.likes_count,
            Self::Comments => tutorial.comments_count,
            Self::Enrollments => tutorial.enrollments_count,
        }
    }
}

/// Add one to a tutorial's counter (single UPDATE, no fetch).
pub async fn increment<C>(conn: &C, tutorial_id: &str, counter: Counter) -> AppResult<()>
where
    C: ConnectionTrait,
{
    let column = counter.column();
    Tutorial::update_many()
        .col_expr(column, Expr::col(column).add(1))
        .col_expr(
            tutorial::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().fixed_offset()),
        )
        .filter(tutorial::Column::Id.eq(tutorial_id))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(())
}

/// Subtract one from a tutorial's counter, never going below zero.
pub async fn decrement<C>(conn: &C, tutorial_id: &str, counter: Counter) -> AppResult<()>
where
    C: ConnectionTrait,
{
    let name = counter.column_name();
    Tutorial::update_many()
        .col_expr(
            counter.column(),
            Expr::cust(format!(
                "CASE WHEN {name} > 0 THEN {name} - 1 ELSE 0 END"
            )),
        )
        .col_expr(
            tutorial::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().fixed_offset()),
        )
        .filter(tutorial::Column::Id.eq(tutorial_id))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{TestDatabase, seed_identity, seed_tutorial};

    #[tokio::test]
    async fn test_decrement_clamps_at_zero() {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = db.connection();
        seed_identity(conn, "alice", "Alice").await.unwrap();
        let t = seed_tutorial(conn, "t1", "alice").await.unwrap();
        assert_eq!(t.likes_count, 0);

        decrement(conn, "t1", Counter::Likes).await.unwrap();
        decrement(conn, "t1", Counter::Likes).await.unwrap();

        let t = Tutorial::find_by_id("t1").one(conn).await.unwrap().unwrap();
        assert_eq!(t.likes_count, 0);
    }

    #[tokio::test]
    async fn test_counters_are_independent() {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = db.connection();
        seed_identity(conn, "alice", "Alice").await.unwrap();
        seed_tutorial(conn, "t1", "alice").await.unwrap();

        increment(conn, "t1", Counter::Likes).await.unwrap();
        increment(conn, "t1", Counter::Likes).await.unwrap();
        increment(conn, "t1", Counter::Comments).await.unwrap();
        decrement(conn, "t1", Counter::Likes).await.unwrap();

        let t = Tutorial::find_by_id("t1").one(conn).await.unwrap().unwrap();
        assert_eq!(Counter::Likes.get(&t), 1);
        assert_eq!(Counter::Comments.get(&t), 1);
        assert_eq!(Counter::Enrollments.get(&t), 0);
    }

    #[tokio::test]
    async fn test_increment_unknown_tutorial_is_noop() {
        let db = TestDatabase::in_memory().await.unwrap();
        increment(db.connection(), "missing", Counter::Enrollments)
            .await
            .unwrap();
    }
}
