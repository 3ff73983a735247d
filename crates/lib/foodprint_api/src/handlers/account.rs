//! Account request handlers. All require authentication.
//!
//! Username and avatar changes answer with a fresh access token so the
//! client's claims catch up immediately.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    AccessTokenResponse, ChangeAvatarRequest, ChangePasswordRequest, ChangeUsernameRequest,
    SuccessResponse,
};

/// `POST /api/users/change/username`
pub async fn change_username_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<ChangeUsernameRequest>, JsonRejection>,
) -> AppResult<Json<AccessTokenResponse>> {
    let Json(body) = body?;
    let access_token = state
        .sessions
        .change_username(&user.0.sub, &body.new_username)
        .await?;
    Ok(Json(AccessTokenResponse { access_token }))
}

/// `POST /api/users/avatar`
pub async fn change_avatar_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<ChangeAvatarRequest>, JsonRejection>,
) -> AppResult<Json<AccessTokenResponse>> {
    let Json(body) = body?;
    let access_token = state
        .sessions
        .change_avatar(&user.0.sub, body.avatar_url.as_deref())
        .await?;
    Ok(Json(AccessTokenResponse { access_token }))
}

/// `POST /api/users/change/password`
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> AppResult<Json<SuccessResponse>> {
    let Json(body) = body?;
    state
        .sessions
        .change_password(&user.0.sub, &body.old_password, &body.new_password)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// `DELETE /api/users/delete`
pub async fn delete_account_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<SuccessResponse>> {
    state.sessions.delete_account(&user.0.sub).await?;
    Ok(Json(SuccessResponse { success: true }))
}
