pub mod health_handler;
pub mod oauth;
pub mod session_handler;
pub mod usage_handler;

pub use health_handler::health_handler;
pub use oauth::{callback_handler, login_handler};
pub use session_handler::{check_handler, logout_handler, me_handler, status_handler};
pub use usage_handler::{DEVICE_ID_HEADER, record_usage_handler, usage_handler};

use axum::{
    http::{
        HeaderValue, StatusCode,
        header::{LOCATION, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Cookie;

/// Bare `OPTIONS` on any route: 200 with no body.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

/// `302 Found` to `location`, emitting one `Set-Cookie` per entry in order.
pub fn found(location: &str, cookies: &[Cookie<'static>]) -> Response {
    let Ok(location) = HeaderValue::from_str(location) else {
        tracing::error!(location = %location, "Redirect target is not a valid header value");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(LOCATION, location);
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.encoded().to_string()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!(cookie = cookie.name(), error = %e, "Unencodable cookie"),
        }
    }
    response
}
