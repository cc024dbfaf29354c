use axum::http::{HeaderMap, header::COOKIE};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub const SESSION_COOKIE: &str = "session";
pub const REDIRECT_INTENT_COOKIE: &str = "intended_redirect";

const REDIRECT_INTENT_TTL: Duration = Duration::minutes(10);

pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

pub fn redirect_intent_cookie(target: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((REDIRECT_INTENT_COOKIE, target.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(REDIRECT_INTENT_TTL)
        .build()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    removal(SESSION_COOKIE)
}

pub fn clear_redirect_intent_cookie() -> Cookie<'static> {
    removal(REDIRECT_INTENT_COOKIE)
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Non-empty session token carried by the request, if any.
///
/// A value whose percent-decoding is not UTF-8 still counts as present and
/// is returned raw.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .flat_map(|value| {
            let raw = String::from_utf8_lossy(value.as_bytes()).into_owned();
            Cookie::split_parse(raw)
                .filter_map(Result::ok)
                .collect::<Vec<_>>()
        })
        .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
        .map(|cookie| {
            Cookie::parse_encoded(cookie.to_string())
                .map(|decoded| decoded.value().to_string())
                .unwrap_or_else(|_| cookie.value().to_string())
        })
}

pub fn redirect_intent(jar: &CookieJar) -> Option<String> {
    non_empty(jar, REDIRECT_INTENT_COOKIE)
}

fn non_empty(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
