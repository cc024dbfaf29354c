use crate::cookies;
use crate::error::AuthError;
use crate::handlers::found;
use crate::models::AppState;
use crate::models::oauth::CallbackParams;
use axum::{
    extract::{Query, State},
    response::Response,
};
use axum_extra::extract::CookieJar;

pub async fn callback_handler(
    State(app_state): State<AppState>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Result<Response, AuthError> {
    let outcome = app_state
        .auth
        .handle_callback(params.code.as_deref(), cookies::redirect_intent(&jar))
        .await?;

    Ok(found(&outcome.location, &outcome.cookies))
}
