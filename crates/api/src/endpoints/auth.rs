//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use tutorhub_common::AppResult;
use tutorhub_core::{SessionResponse, SignInInput, SignUpInput};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create a new account and sign in.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignUpInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state.auth_service.sign_up(input).await?;
    Ok(ApiResponse::ok(session))
}

/// Sign in with email and password.
async fn signin(
    State(state): State<AppState>,
    Json(input): Json<SignInInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state.auth_service.sign_in(input).await?;
    Ok(ApiResponse::ok(session))
}

/// Revoke the current token.
async fn signout(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state.auth_service.sign_out(&ctx).await?;
    Ok(ApiResponse::ok(()))
}

/// Delete the caller's account and everything it owns.
async fn delete_account(
    AuthUser(ctx): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state.auth_service.delete_account(&ctx).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/i/delete", post(delete_account))
}
