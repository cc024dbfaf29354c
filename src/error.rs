use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::models::oauth::ErrorResponse;
use crate::services::provider::ProviderError;
use crate::services::user_store::StoreError;

/// Failures surfaced by the auth routes. Upstream variants keep their cause
/// for logging but all render the same client message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization code missing")]
    MissingCode,

    #[error("token exchange failed: {0}")]
    TokenExchange(#[source] ProviderError),

    #[error("user info request failed: {0}")]
    UserInfo(#[source] ProviderError),

    #[error("user store failed: {0}")]
    UserStore(#[from] StoreError),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Device id missing")]
    MissingDeviceId,

    #[error("Usage limit reached")]
    UsageExhausted,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCode | Self::MissingDeviceId => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::UsageExhausted => StatusCode::TOO_MANY_REQUESTS,
            Self::TokenExchange(_) | Self::UserInfo(_) | Self::UserStore(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            Self::MissingCode
            | Self::Unauthenticated
            | Self::MissingDeviceId
            | Self::UsageExhausted => self.to_string(),
            Self::TokenExchange(_) | Self::UserInfo(_) | Self::UserStore(_) => {
                tracing::error!(error = %self, "Auth request failed");
                "Authentication failed".to_string()
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
