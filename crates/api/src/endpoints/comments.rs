//! Comment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use tutorhub_common::AppResult;
use tutorhub_core::{
    CommentResponse,
    services::tutorial::{DEFAULT_BROWSE_LIMIT, MAX_BROWSE_LIMIT},
    validation::clamp_limit,
};

use super::Page;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsRequest {
    pub tutorial_id: String,
    #[serde(flatten)]
    pub page: Page,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub tutorial_id: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    pub comment_id: String,
}

/// Comments on a tutorial, oldest first.
async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListCommentsRequest>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let limit = clamp_limit(req.page.limit, DEFAULT_BROWSE_LIMIT, MAX_BROWSE_LIMIT);
    let comments = state
        .comment_service
        .list(&req.tutorial_id, limit, req.page.offset.unwrap_or(0))
        .await?;
    Ok(ApiResponse::ok(comments))
}

/// Comment on a tutorial.
async fn create(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state
        .comment_service
        .create(&ctx, &req.tutorial_id, &req.content)
        .await?;
    Ok(ApiResponse::ok(comment))
}

/// Delete one of the caller's comments.
async fn delete(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteCommentRequest>,
) -> AppResult<ApiResponse<()>> {
    state.comment_service.delete(&ctx, &req.comment_id).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tutorials/comments", post(list))
        .route("/comments/create", post(create))
        .route("/comments/delete", post(delete))
}
