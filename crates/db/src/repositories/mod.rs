//! Repositories: the only code that reads or writes rows.
//!
//! Every method takes the caller's [`AuthContext`](tutorhub_common::AuthContext)
//! where the policy needs one, and writes to child tables go through the
//! counter path in [`crate::counters`].

mod comment;
mod enrollment;
mod identity;
mod like;
mod profile;
mod tutorial;

pub use comment::CommentRepository;
pub use enrollment::EnrollmentRepository;
pub use identity::{DEFAULT_FULL_NAME, IdentityRepository};
pub use like::LikeRepository;
pub use profile::ProfileRepository;
pub use tutorial::{CounterTotals, TutorialFilter, TutorialRepository, TutorialSort};

use sea_orm::{ActiveValue, DbErr, SqlErr};
use tutorhub_common::{AppError, AppResult};

/// Map an insert failure, turning uniqueness violations into `Conflict`.
pub(crate) fn insert_error(err: DbErr, conflict: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(conflict.to_string()),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::NotFound("Referenced row does not exist".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

/// Value of a column the caller must have set on an active model.
pub(crate) fn required<'a>(value: &'a ActiveValue<String>, field: &str) -> AppResult<&'a str> {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Ok(v.as_str()),
        ActiveValue::NotSet => Err(AppError::BadRequest(format!("{field} is required"))),
    }
}
