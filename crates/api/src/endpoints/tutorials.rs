//! Tutorial endpoints.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use bytes::Bytes;
use serde::{Deserialize, de::DeserializeOwned};
use tutorhub_common::{AppError, AppResult};
use tutorhub_core::{
    BrowseQuery, BrowseResponse, CreateTutorialInput, DashboardResponse, HomeResponse,
    TutorialDetailResponse, TutorialResponse, UpdateTutorialInput,
};

use super::{Page, TutorialIdRequest};
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTutorialsRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub page: Page,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTutorialRequest {
    pub tutorial_id: String,
    #[serde(flatten)]
    pub input: UpdateTutorialInput,
}

/// Read a tutorial form: a `data` part holding the JSON body and an optional
/// `thumbnail` file part.
async fn read_form<T: DeserializeOwned>(mut multipart: Multipart) -> AppResult<(T, Option<Bytes>)> {
    let mut data: Option<T> = None;
    let mut thumbnail: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "data" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                data = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| AppError::BadRequest(format!("Invalid data: {e}")))?,
                );
            }
            "thumbnail" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                // Browsers send an empty part for an untouched file input
                if !bytes.is_empty() {
                    thumbnail = Some(bytes);
                }
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::BadRequest("Missing data part".to_string()))?;
    Ok((data, thumbnail))
}

/// Featured and recent tutorials.
async fn home(State(state): State<AppState>) -> AppResult<ApiResponse<HomeResponse>> {
    Ok(ApiResponse::ok(state.tutorial_service.home().await?))
}

/// Search, filter and sort tutorials.
async fn browse(
    State(state): State<AppState>,
    Json(query): Json<BrowseQuery>,
) -> AppResult<ApiResponse<BrowseResponse>> {
    Ok(ApiResponse::ok(state.tutorial_service.browse(query).await?))
}

/// Tutorial detail, personalised for a signed-in viewer.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<TutorialIdRequest>,
) -> AppResult<ApiResponse<TutorialDetailResponse>> {
    let detail = state
        .tutorial_service
        .get(&req.tutorial_id, viewer.as_ref())
        .await?;
    Ok(ApiResponse::ok(detail))
}

/// Tutorials published by a user.
async fn user_tutorials(
    State(state): State<AppState>,
    Json(req): Json<UserTutorialsRequest>,
) -> AppResult<ApiResponse<Vec<TutorialResponse>>> {
    let tutorials = state
        .tutorial_service
        .list_by_user(&req.user_id, req.page.limit, req.page.offset)
        .await?;
    Ok(ApiResponse::ok(tutorials))
}

/// The caller's dashboard.
async fn dashboard(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardResponse>> {
    Ok(ApiResponse::ok(state.tutorial_service.dashboard(&ctx).await?))
}

/// Publish a tutorial.
async fn create(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<TutorialResponse>> {
    let (input, thumbnail) = read_form::<CreateTutorialInput>(multipart).await?;
    let tutorial = state
        .tutorial_service
        .create(&ctx, input, thumbnail)
        .await?;
    Ok(ApiResponse::ok(tutorial))
}

/// Edit one of the caller's tutorials.
async fn update(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<TutorialResponse>> {
    let (req, thumbnail) = read_form::<UpdateTutorialRequest>(multipart).await?;
    let tutorial = state
        .tutorial_service
        .update(&ctx, &req.tutorial_id, req.input, thumbnail)
        .await?;
    Ok(ApiResponse::ok(tutorial))
}

/// Delete one of the caller's tutorials.
async fn delete(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TutorialIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state.tutorial_service.delete(&ctx, &req.tutorial_id).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    // Upload size is enforced by the thumbnail service and the server's
    // request body limit.
    let forms = Router::new()
        .route("/tutorials/create", post(create))
        .route("/tutorials/update", post(update))
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .route("/tutorials/home", post(home))
        .route("/tutorials/browse", post(browse))
        .route("/tutorials/show", post(show))
        .route("/tutorials/user", post(user_tutorials))
        .route("/tutorials/dashboard", post(dashboard))
        .route("/tutorials/delete", post(delete))
        .merge(forms)
}
