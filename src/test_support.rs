//! Fixtures shared by the unit tests: a local stand-in for the identity
//! provider and config pointed at it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use oauth2::AccessToken;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::models::app_config::AppConfig;
use crate::models::oauth::UserInfo;
use crate::models::user::{DeviceUsage, User};
use crate::services::user_store::{StoreError, UserStore};

pub fn test_config(provider_base: &str) -> AppConfig {
    let values: HashMap<&str, String> = HashMap::from([
        ("GOOGLE_CLIENT_ID", "test-client".to_string()),
        ("GOOGLE_CLIENT_SECRET", "test-secret".to_string()),
        ("GOOGLE_TOKEN_URL", format!("{provider_base}/token")),
        ("GOOGLE_USERINFO_URL", format!("{provider_base}/userinfo")),
        ("BIND_ADDR", "127.0.0.1:0".to_string()),
    ]);
    AppConfig::from_lookup(|key| values.get(key).cloned()).unwrap()
}

#[derive(Default)]
struct FakeState {
    token_requests: AtomicUsize,
    last_form: Mutex<Option<HashMap<String, String>>>,
}

/// Token and user-info endpoints served from an ephemeral local port.
///
/// Code `bad` is rejected by the token endpoint. Code
/// [`FakeProvider::USERINFO_FAILS`] yields a token the user-info endpoint
/// rejects. Any other code `c` yields access token `access-c`.
pub struct FakeProvider {
    addr: std::net::SocketAddr,
    state: Arc<FakeState>,
}

impl FakeProvider {
    pub const USERINFO_FAILS: &'static str = "userinfo-fails";

    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/token", post(token))
            .route("/userinfo", get(userinfo))
            .with_state(state.clone());

        let addr = serve(app).await;
        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    pub async fn last_token_form(&self) -> Option<HashMap<String, String>> {
        self.state.last_form.lock().await.clone()
    }
}

async fn token(
    State(state): State<Arc<FakeState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);
    let code = form.get("code").cloned().unwrap_or_default();
    *state.last_form.lock().await = Some(form);

    if code == "bad" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Bad Request"})),
        )
            .into_response();
    }

    Json(json!({
        "access_token": format!("access-{code}"),
        "refresh_token": format!("refresh-{code}"),
        "token_type": "Bearer",
        "expires_in": 3599,
        "id_token": "header.payload.sig",
    }))
    .into_response()
}

async fn userinfo(headers: HeaderMap) -> Response {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();

    let valid = token.starts_with("access-")
        && token != format!("access-{}", FakeProvider::USERINFO_FAILS);
    if !valid {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_token"}))).into_response();
    }

    Json(json!({
        "id": "google-42",
        "email": "ada@example.com",
        "verified_email": true,
        "name": "Ada Lovelace",
        "picture": "https://example.com/ada.png",
    }))
    .into_response()
}

/// Binds `app` to `127.0.0.1:0` and serves it in the background.
pub async fn serve(app: Router) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub struct FailingStore;

#[async_trait]
impl UserStore for FailingStore {
    async fn upsert_login(
        &self,
        _info: &UserInfo,
        _token: &AccessToken,
    ) -> Result<User, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_by_session(&self, _token: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn device_usage(&self, _device_id: &str) -> Result<DeviceUsage, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn record_device_use(
        &self,
        _device_id: &str,
        _limit: u32,
        _session_token: Option<&str>,
    ) -> Result<Option<DeviceUsage>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}
