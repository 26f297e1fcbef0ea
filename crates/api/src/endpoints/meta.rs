//! Meta endpoints.

use axum::{Router, extract::State, routing::post};
use sea_orm::Iterable;
use serde::Serialize;
use tutorhub_db::entities::tutorial::{Category, Difficulty};

use crate::{middleware::AppState, response::ApiResponse};

/// Server metadata response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    pub name: String,
    pub version: String,
    pub categories: Vec<Category>,
    pub difficulties: Vec<Difficulty>,
    pub max_upload_bytes: u64,
}

/// Get server metadata.
async fn meta(State(state): State<AppState>) -> ApiResponse<MetaResponse> {
    ApiResponse::ok(MetaResponse {
        name: "tutorhub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        categories: Category::iter().collect(),
        difficulties: Difficulty::iter().collect(),
        max_upload_bytes: state.thumbnail_service.max_upload_bytes(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(meta))
}
