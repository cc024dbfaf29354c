use oauth2::{AccessToken, RefreshToken};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::user::User;

#[derive(Debug, Deserialize, Default)]
pub struct LoginParams {
    pub callback: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
}

/// Body of a successful authorization-code exchange.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: AccessToken,
    pub refresh_token: Option<RefreshToken>,
    pub expires_in: Option<u64>,
}

/// Profile returned by the provider's user-info endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of `/status`: the session's user, or `null` when anonymous.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    pub user: Option<User>,
}

/// Per-device usage counter as reported to the frontend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub device_id: String,
    pub usage_count: u32,
    pub max_usage: u32,
    pub remaining_usage: u32,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_used: Option<OffsetDateTime>,
}
