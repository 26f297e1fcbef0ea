//! Like endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;
use tutorhub_common::AppResult;
use tutorhub_core::TutorialResponse;

use super::{Page, TutorialIdRequest};
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Changed},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeResponse {
    pub liked: bool,
}

/// Like a tutorial. Liking twice is a no-op.
async fn like(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TutorialIdRequest>,
) -> AppResult<ApiResponse<Changed>> {
    let created = state.like_service.like(&ctx, &req.tutorial_id).await?;
    Ok(ApiResponse::ok(created.into()))
}

/// Remove the caller's like.
async fn unlike(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TutorialIdRequest>,
) -> AppResult<ApiResponse<Changed>> {
    let removed = state.like_service.unlike(&ctx, &req.tutorial_id).await?;
    Ok(ApiResponse::ok(removed.into()))
}

/// Flip the caller's like.
async fn toggle(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TutorialIdRequest>,
) -> AppResult<ApiResponse<ToggleLikeResponse>> {
    let liked = state.like_service.toggle(&ctx, &req.tutorial_id).await?;
    Ok(ApiResponse::ok(ToggleLikeResponse { liked }))
}

/// Tutorials the caller liked.
async fn liked(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(page): Json<Page>,
) -> AppResult<ApiResponse<Vec<TutorialResponse>>> {
    let tutorials = state
        .like_service
        .liked_by(&ctx, page.limit, page.offset)
        .await?;
    Ok(ApiResponse::ok(tutorials))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tutorials/like", post(like))
        .route("/tutorials/unlike", post(unlike))
        .route("/tutorials/like/toggle", post(toggle))
        .route("/tutorials/liked", post(liked))
}
