use crate::cookies;
use crate::error::AuthError;
use crate::models::AppState;
use crate::models::oauth::UsageStats;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderName},
    response::Json,
};

/// Device fingerprint supplied by the frontend.
pub const DEVICE_ID_HEADER: HeaderName = HeaderName::from_static("x-device-id");

fn device_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(DEVICE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
}

pub async fn usage_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsageStats>, AuthError> {
    let stats = app_state.usage.stats(device_id(&headers)).await?;
    Ok(Json(stats))
}

pub async fn record_usage_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsageStats>, AuthError> {
    let session = cookies::session_token(&headers);
    let stats = app_state
        .usage
        .record_use(device_id(&headers), session.as_deref())
        .await?;
    Ok(Json(stats))
}
