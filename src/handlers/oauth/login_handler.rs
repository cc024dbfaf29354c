use crate::handlers::found;
use crate::models::AppState;
use crate::models::oauth::LoginParams;
use axum::{
    extract::{Query, State},
    response::Response,
};

pub async fn login_handler(
    State(app_state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> Response {
    let login = app_state.auth.initiate_login(params.callback.as_deref());

    found(login.location.as_str(), &[login.intent_cookie])
}
