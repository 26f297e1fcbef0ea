//! API endpoints.

mod auth;
mod comments;
mod enrollments;
mod files;
mod likes;
mod meta;
mod profiles;
mod tutorials;

use axum::Router;
use serde::Deserialize;

use crate::middleware::AppState;

/// Pagination shared by list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

/// Request naming a single tutorial.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialIdRequest {
    pub tutorial_id: String,
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(profiles::router())
        .merge(tutorials::router())
        .merge(likes::router())
        .merge(comments::router())
        .merge(enrollments::router())
        .merge(files::router())
        .nest("/meta", meta::router())
}
