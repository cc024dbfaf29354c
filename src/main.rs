use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vibelytube_auth_server::build_router;
use vibelytube_auth_server::models::{AppConfig, AppState};
use vibelytube_auth_server::services::{
    AuthSessionManager, GoogleProvider, MemoryUserStore, UsageTracker,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let app_config = Arc::new(AppConfig::from_env()?);

    let provider = GoogleProvider::new(&app_config);
    let users = Arc::new(MemoryUserStore::new());
    let app_state = AppState {
        config: app_config.clone(),
        usage: Arc::new(UsageTracker::new(users.clone(), app_config.max_device_usage)),
        auth: Arc::new(AuthSessionManager::new(app_config.clone(), provider, users)),
    };

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(app_config.bind_addr).await?;
    tracing::info!(
        "Server running on {} in {} mode",
        listener.local_addr()?,
        app_config.environment.as_str()
    );
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
