//! Thumbnail upload endpoints.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use serde::Deserialize;
use tutorhub_common::{AppError, AppResult};
use tutorhub_core::ThumbnailResponse;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteThumbnailRequest {
    pub key: String,
}

/// Upload a thumbnail into the caller's namespace.
async fn upload(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<ThumbnailResponse>> {
    let mut file_data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?,
            );
        }
    }

    let data = file_data.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    let uploaded = state.thumbnail_service.upload(&ctx, &data).await?;
    Ok(ApiResponse::ok(uploaded.into()))
}

/// Delete a thumbnail from the caller's namespace.
async fn delete(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteThumbnailRequest>,
) -> AppResult<ApiResponse<()>> {
    state.thumbnail_service.delete(&ctx, &req.key).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/files/thumbnail",
            post(upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/files/thumbnail/delete", post(delete))
}
