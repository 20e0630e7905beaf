//! Session endpoints. Sessions are issued from the command line; the API
//! only reports who is signed in and signs out.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::{CookieJar, cookie::Cookie};

use crate::api::error::ApiResult;
use crate::api::extractors::{CurrentUser, SESSION_COOKIE};
use crate::api::state::AppState;
use crate::domain::User;

/// `GET /api/me`
pub async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, StatusCode)> {
    state.service.revoke_session(&current.token).await?;
    tracing::info!(user = %current.user.username, "Signed out");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}
