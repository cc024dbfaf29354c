use crate::cookies;
use crate::error::AuthError;
use crate::models::AppState;
use crate::models::oauth::{CheckResponse, MessageResponse, StatusResponse};
use crate::models::user::User;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use axum_extra::extract::CookieJar;

pub async fn check_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CheckResponse>, AuthError> {
    app_state
        .auth
        .check_session(cookies::session_token(&headers).as_deref())?;

    Ok(Json(CheckResponse {
        authenticated: true,
    }))
}

pub async fn me_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, AuthError> {
    let user = app_state
        .auth
        .current_user(cookies::session_token(&headers).as_deref())
        .await?;

    Ok(Json(user))
}

/// Always 200 for a reachable store; anonymous callers get `user: null`.
pub async fn status_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AuthError> {
    let user = app_state
        .auth
        .session_user(cookies::session_token(&headers).as_deref())
        .await?;

    Ok(Json(StatusResponse {
        authenticated: user.is_some(),
        user,
    }))
}

pub async fn logout_handler(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> impl IntoResponse {
    let jar = jar.add(app_state.auth.logout());

    (
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}
