//! Authentication request handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use foodprint_core::auth::AuthError;
use tracing::debug;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse, RevokeResponse,
    TokenResponse,
};

/// `POST /api/users/register` — create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(body) = body?;
    let user = state
        .sessions
        .register(&body.username, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `POST /api/users/login` — authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(body) = body?;
    let pair = state.sessions.login(&body.username, &body.password).await?;
    Ok(Json(pair.into()))
}

/// `POST /api/users/refresh_token` — exchange a refresh token for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(body) = body?;
    let Some(refresh_token) = body.refresh_token.filter(|t| !t.is_empty()) else {
        debug!("refresh rejected: no token in body");
        return Err(AuthError::Unauthorized.into());
    };
    let pair = state.sessions.refresh(&refresh_token).await?;
    Ok(Json(pair.into()))
}

/// `POST /api/users/revoke_token` — invalidate all of the caller's refresh
/// tokens. Requires authentication.
pub async fn revoke_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<RevokeResponse>> {
    let token_version = state.sessions.revoke_all(&user.0.sub).await?;
    Ok(Json(RevokeResponse { token_version }))
}
