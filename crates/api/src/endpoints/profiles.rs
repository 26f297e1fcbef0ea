//! Profile endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use tutorhub_common::{AppError, AppResult};
use tutorhub_core::{ProfileResponse, UpdateProfileInput};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowProfileRequest {
    /// Defaults to the caller's own profile.
    #[serde(default)]
    pub profile_id: Option<String>,
}

/// Show a profile.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowProfileRequest>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let id = req
        .profile_id
        .or_else(|| viewer.map(|ctx| ctx.identity_id))
        .ok_or_else(|| AppError::BadRequest("profileId is required".to_string()))?;

    let profile = state.profile_service.get(&id).await?;
    Ok(ApiResponse::ok(profile))
}

/// Update the caller's own profile.
async fn update(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = state
        .profile_service
        .update(&ctx, &ctx.identity_id, input)
        .await?;
    Ok(ApiResponse::ok(profile))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles/show", post(show))
        .route("/profiles/update", post(update))
}
