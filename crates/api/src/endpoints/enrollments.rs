//! Enrollment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use tutorhub_common::AppResult;
use tutorhub_core::TutorialResponse;

use super::{Page, TutorialIdRequest};
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Changed},
};

/// Enroll in a tutorial. Enrolling twice is a no-op.
async fn enroll(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TutorialIdRequest>,
) -> AppResult<ApiResponse<Changed>> {
    let created = state
        .enrollment_service
        .enroll(&ctx, &req.tutorial_id)
        .await?;
    Ok(ApiResponse::ok(created.into()))
}

/// Leave a tutorial.
async fn unenroll(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TutorialIdRequest>,
) -> AppResult<ApiResponse<Changed>> {
    let removed = state
        .enrollment_service
        .unenroll(&ctx, &req.tutorial_id)
        .await?;
    Ok(ApiResponse::ok(removed.into()))
}

/// Tutorials the caller is enrolled in.
async fn mine(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(page): Json<Page>,
) -> AppResult<ApiResponse<Vec<TutorialResponse>>> {
    let tutorials = state
        .enrollment_service
        .my_enrollments(&ctx, page.limit, page.offset)
        .await?;
    Ok(ApiResponse::ok(tutorials))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tutorials/enroll", post(enroll))
        .route("/tutorials/unenroll", post(unenroll))
        .route("/enrollments/mine", post(mine))
}
