use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_SECURITY_POLICY, CONTENT_TYPE},
    },
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::handlers::{
    DEVICE_ID_HEADER, callback_handler, check_handler, health_handler, login_handler,
    logout_handler, me_handler, preflight_handler, record_usage_handler, status_handler,
    usage_handler,
};
use crate::models::{AppConfig, AppState};

pub const AUTH_PREFIX: &str = "/api/auth";

const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'self'; \
    img-src 'self' data: https: http: *; \
    script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
    style-src 'self' 'unsafe-inline'; \
    connect-src 'self' https: http: *; \
    font-src 'self' data: https: http:;";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_handler).options(preflight_handler))
        .route("/callback", get(callback_handler).options(preflight_handler))
        .route("/check", get(check_handler).options(preflight_handler))
        .route("/logout", post(logout_handler).options(preflight_handler))
        .route("/me", get(me_handler).options(preflight_handler))
        .route("/status", get(status_handler).options(preflight_handler))
        .route(
            "/usage",
            get(usage_handler)
                .post(record_usage_handler)
                .options(preflight_handler),
        )
        // paths the frontend's login link and the provider registration use
        .route("/google", get(login_handler).options(preflight_handler))
        .route(
            "/google/callback",
            get(callback_handler).options(preflight_handler),
        )
}

pub fn build_router(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);

    Router::new()
        .route("/health", get(health_handler).options(preflight_handler))
        .nest(AUTH_PREFIX, auth_routes())
        .layer(cors)
        // must wrap CORS to reach preflight responses
        .layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Credentialed CORS for the configured frontend origin only.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = match HeaderValue::from_str(&config.frontend_origin()) {
        Ok(origin) => AllowOrigin::list([origin]),
        Err(e) => {
            tracing::warn!(error = %e, "Frontend origin is not a header value, CORS disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, DEVICE_ID_HEADER])
}
