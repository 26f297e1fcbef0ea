//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use tutorhub_core::{
    AuthService, CommentService, EnrollmentService, LikeService, ProfileService,
    ThumbnailService, TutorialService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub profile_service: ProfileService,
    pub tutorial_service: TutorialService,
    pub like_service: LikeService,
    pub comment_service: CommentService,
    pub enrollment_service: EnrollmentService,
    pub thumbnail_service: ThumbnailService,
}

/// Authentication middleware.
///
/// Resolves a bearer token into an [`tutorhub_common::AuthContext`] request
/// extension. Requests without a valid token pass through anonymously; the
/// extractors decide whether that is acceptable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.auth_service.authenticate_by_token(token).await {
            Ok(ctx) => {
                req.extensions_mut().insert(ctx);
            }
            Err(e) => debug!(error = %e, "Ignoring invalid bearer token"),
        }
    }

    next.run(req).await
}
