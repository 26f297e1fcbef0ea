//! Enrollment service.

use tracing::{debug, info};
use tutorhub_common::{AppError, AppResult, AuthContext, IdGenerator};
use tutorhub_db::repositories::{EnrollmentRepository, ProfileRepository, TutorialRepository};

use super::tutorial::{
    DEFAULT_BROWSE_LIMIT, MAX_BROWSE_LIMIT, TutorialResponse, in_order, with_authors,
};
use crate::validation::clamp_limit;

/// Service for enrolling in tutorials.
#[derive(Clone)]
pub struct EnrollmentService {
    enrollment_repo: EnrollmentRepository,
    tutorial_repo: TutorialRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

impl EnrollmentService {
    /// Create a new enrollment service.
    #[must_use]
    pub const fn new(
        enrollment_repo: EnrollmentRepository,
        tutorial_repo: TutorialRepository,
        profile_repo: ProfileRepository,
    ) -> Self {
        Self {
            enrollment_repo,
            tutorial_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Enroll in a tutorial. Returns `false` if already enrolled.
    pub async fn enroll(&self, ctx: &AuthContext, tutorial_id: &str) -> AppResult<bool> {
        match self
            .enrollment_repo
            .create(ctx, &self.id_gen.generate(), tutorial_id)
            .await
        {
            Ok(_) => {
                info!(tutorial_id = %tutorial_id, user_id = %ctx.identity_id, "Enrolled");
                Ok(true)
            }
            Err(AppError::Conflict(_)) => {
                debug!(tutorial_id = %tutorial_id, user_id = %ctx.identity_id, "Already enrolled");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Leave a tutorial. Returns `false` if the caller was not enrolled.
    pub async fn unenroll(&self, ctx: &AuthContext, tutorial_id: &str) -> AppResult<bool> {
        let removed = self.enrollment_repo.delete(ctx, tutorial_id).await?;
        if !removed {
            debug!(tutorial_id = %tutorial_id, user_id = %ctx.identity_id, "Not enrolled");
        }
        Ok(removed)
    }

    /// Whether the caller is enrolled in a tutorial.
    pub async fn is_enrolled(&self, ctx: &AuthContext, tutorial_id: &str) -> AppResult<bool> {
        Ok(self.enrollment_repo.find_mine(ctx, tutorial_id).await?.is_some())
    }

    /// Tutorials the caller is enrolled in, most recent first.
    pub async fn my_enrollments(
        &self,
        ctx: &AuthContext,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> AppResult<Vec<TutorialResponse>> {
        let limit = clamp_limit(limit, DEFAULT_BROWSE_LIMIT, MAX_BROWSE_LIMIT);
        let rows = self
            .enrollment_repo
            .find_mine_paginated(ctx, limit, offset.unwrap_or(0))
            .await?;

        let ids: Vec<String> = rows.into_iter().map(|e| e.tutorial_id).collect();
        let tutorials = self.tutorial_repo.find_by_ids(&ids).await?;
        with_authors(&self.profile_repo, in_order(&ids, tutorials)).await
    }
}
