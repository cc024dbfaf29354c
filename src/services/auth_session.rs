//! Login flow orchestration.
//!
//! A browser moves `Anonymous -> LoginInitiated -> CallbackPending ->
//! Authenticated` and back to `Anonymous` on logout. No server-side state
//! tracks that progression: the `intended_redirect` cookie marks a started
//! login, the `session` cookie marks a finished one.

use std::sync::Arc;

use axum_extra::extract::cookie::Cookie;
use oauth2::AuthorizationCode;
use url::Url;

use crate::cookies;
use crate::error::AuthError;
use crate::models::app_config::AppConfig;
use crate::models::user::User;
use crate::services::provider::GoogleProvider;
use crate::services::user_store::UserStore;

/// Redirect to the provider plus the cookie recording where to return.
#[derive(Debug)]
pub struct LoginRedirect {
    pub location: Url,
    pub intent_cookie: Cookie<'static>,
}

/// Result of a completed callback. `cookies` is ordered: the session write
/// comes first, the redirect-intent clear second.
#[derive(Debug)]
pub struct CallbackOutcome {
    pub location: String,
    pub cookies: [Cookie<'static>; 2],
    pub user: User,
}

pub struct AuthSessionManager {
    config: Arc<AppConfig>,
    provider: GoogleProvider,
    users: Arc<dyn UserStore>,
}

impl AuthSessionManager {
    pub fn new(
        config: Arc<AppConfig>,
        provider: GoogleProvider,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            config,
            provider,
            users,
        }
    }

    /// Starts a login. An absent or empty `requested_callback` returns the
    /// user to the frontend root.
    pub fn initiate_login(&self, requested_callback: Option<&str>) -> LoginRedirect {
        let target = requested_callback
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.config.profile.frontend_url.to_string());

        tracing::debug!(target = %target, "Starting login");

        LoginRedirect {
            location: self.provider.authorization_url(),
            intent_cookie: cookies::redirect_intent_cookie(
                &target,
                self.config.secure_cookies(),
            ),
        }
    }

    /// Completes a login. Both provider calls and the user upsert finish
    /// before any cookie is produced, so an error leaves the browser's
    /// cookies as they were.
    pub async fn handle_callback(
        &self,
        code: Option<&str>,
        intended_redirect: Option<String>,
    ) -> Result<CallbackOutcome, AuthError> {
        let code = code
            .filter(|c| !c.is_empty())
            .map(|c| AuthorizationCode::new(c.to_string()))
            .ok_or(AuthError::MissingCode)?;

        let tokens = self
            .provider
            .exchange_code(&code)
            .await
            .map_err(AuthError::TokenExchange)?;

        tracing::debug!(
            has_refresh_token = tokens.refresh_token.is_some(),
            expires_in = ?tokens.expires_in,
            "Authorization code exchanged"
        );

        let info = self
            .provider
            .fetch_user_info(&tokens.access_token)
            .await
            .map_err(AuthError::UserInfo)?;

        let user = self.users.upsert_login(&info, &tokens.access_token).await?;

        let location = intended_redirect
            .filter(|target| !target.chars().any(char::is_control))
            .unwrap_or_else(|| self.config.profile.default_redirect.to_string());

        tracing::info!(user_id = user.id, provider_id = %user.provider_id, "Login successful");

        Ok(CallbackOutcome {
            location,
            cookies: [
                cookies::session_cookie(
                    tokens.access_token.secret(),
                    self.config.secure_cookies(),
                ),
                cookies::clear_redirect_intent_cookie(),
            ],
            user,
        })
    }

    /// Presence of a non-empty session token is treated as authenticated;
    /// the token is not re-validated with the provider.
    pub fn check_session(&self, session_token: Option<&str>) -> Result<(), AuthError> {
        match session_token {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(AuthError::Unauthenticated),
        }
    }

    /// Resolves the session token to its user record.
    pub async fn current_user(&self, session_token: Option<&str>) -> Result<User, AuthError> {
        self.session_user(session_token)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    /// Like [`Self::current_user`], but an absent or unknown session is
    /// `None` rather than an error. Store failures still propagate.
    pub async fn session_user(
        &self,
        session_token: Option<&str>,
    ) -> Result<Option<User>, AuthError> {
        match session_token.filter(|token| !token.is_empty()) {
            Some(token) => Ok(self.users.find_by_session(token).await?),
            None => Ok(None),
        }
    }

    /// The session clear is emitted whether or not a session existed.
    pub fn logout(&self) -> Cookie<'static> {
        cookies::clear_session_cookie()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::user_store::MemoryUserStore;
    use crate::test_support::{FailingStore, FakeProvider, test_config};
    use time::Duration;

    fn manager_with(base_url: &str, users: Arc<dyn UserStore>) -> AuthSessionManager {
        let config = Arc::new(test_config(base_url));
        let provider = GoogleProvider::new(&config);
        AuthSessionManager::new(config, provider, users)
    }

    fn manager(base_url: &str) -> AuthSessionManager {
        manager_with(base_url, Arc::new(MemoryUserStore::new()))
    }

    #[test]
    fn test_initiate_login_stores_requested_callback() {
        let auth = manager("http://127.0.0.1:9");
        let login = auth.initiate_login(Some("https://app.example/analysis"));

        assert_eq!(login.intent_cookie.name(), cookies::REDIRECT_INTENT_COOKIE);
        assert_eq!(login.intent_cookie.value(), "https://app.example/analysis");
        assert_eq!(login.location.host_str(), Some("accounts.google.com"));
    }

    #[test]
    fn test_initiate_login_defaults_to_frontend() {
        let auth = manager("http://127.0.0.1:9");
        for requested in [None, Some("")] {
            let login = auth.initiate_login(requested);
            assert_eq!(login.intent_cookie.value(), "http://localhost:3000/");
        }
    }

    #[tokio::test]
    async fn test_callback_sets_session_then_clears_intent() {
        let fake = FakeProvider::start().await;
        let auth = manager(&fake.base_url());

        let outcome = auth
            .handle_callback(Some("abc"), Some("https://app.example/analysis".into()))
            .await
            .unwrap();

        assert_eq!(outcome.location, "https://app.example/analysis");
        let [session, intent] = &outcome.cookies;
        assert_eq!(session.name(), cookies::SESSION_COOKIE);
        assert_eq!(session.value(), "access-abc");
        assert_eq!(intent.name(), cookies::REDIRECT_INTENT_COOKIE);
        assert_eq!(intent.max_age(), Some(Duration::ZERO));
        assert_eq!(outcome.user.provider_id, "google-42");
    }

    #[tokio::test]
    async fn test_callback_without_intent_uses_default_redirect() {
        let fake = FakeProvider::start().await;
        let auth = manager(&fake.base_url());

        let outcome = auth.handle_callback(Some("abc"), None).await.unwrap();
        assert_eq!(outcome.location, "http://localhost:3000/analysis");
    }

    #[tokio::test]
    async fn test_unusable_intent_falls_back_to_default() {
        let fake = FakeProvider::start().await;
        let auth = manager(&fake.base_url());

        let outcome = auth
            .handle_callback(
                Some("abc"),
                Some("https://x.example/\r\nSet-Cookie: a=b".into()),
            )
            .await
            .unwrap();
        assert_eq!(outcome.location, "http://localhost:3000/analysis");
    }

    #[tokio::test]
    async fn test_callback_error_taxonomy() {
        let fake = FakeProvider::start().await;
        let auth = manager(&fake.base_url());

        assert!(matches!(
            auth.handle_callback(None, None).await,
            Err(AuthError::MissingCode)
        ));
        assert!(matches!(
            auth.handle_callback(Some(""), None).await,
            Err(AuthError::MissingCode)
        ));
        assert!(matches!(
            auth.handle_callback(Some("bad"), None).await,
            Err(AuthError::TokenExchange(_))
        ));
        assert!(matches!(
            auth.handle_callback(Some(FakeProvider::USERINFO_FAILS), None).await,
            Err(AuthError::UserInfo(_))
        ));
        // empty and absent codes never reach the token endpoint
        assert_eq!(fake.token_requests(), 2);
    }

    #[tokio::test]
    async fn test_missing_code_makes_no_provider_call() {
        let fake = FakeProvider::start().await;
        let auth = manager(&fake.base_url());

        let _ = auth.handle_callback(None, None).await;
        assert_eq!(fake.token_requests(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let fake = FakeProvider::start().await;
        let auth = manager_with(&fake.base_url(), Arc::new(FailingStore));

        assert!(matches!(
            auth.handle_callback(Some("abc"), None).await,
            Err(AuthError::UserStore(_))
        ));
    }

    #[test]
    fn test_check_session_is_presence_only() {
        let auth = manager("http://127.0.0.1:9");
        assert!(auth.check_session(Some("anything")).is_ok());
        assert!(matches!(auth.check_session(Some("")), Err(AuthError::Unauthenticated)));
        assert!(matches!(auth.check_session(None), Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_current_user_requires_known_token() {
        let fake = FakeProvider::start().await;
        let auth = manager(&fake.base_url());

        assert!(matches!(
            auth.current_user(Some("unknown")).await,
            Err(AuthError::Unauthenticated)
        ));

        let outcome = auth.handle_callback(Some("abc"), None).await.unwrap();
        let user = auth.current_user(Some("access-abc")).await.unwrap();
        assert_eq!(user, outcome.user);
    }

    #[tokio::test]
    async fn test_session_user_is_optional() {
        let fake = FakeProvider::start().await;
        let auth = manager(&fake.base_url());

        assert_eq!(auth.session_user(None).await.unwrap(), None);
        assert_eq!(auth.session_user(Some("")).await.unwrap(), None);
        assert_eq!(auth.session_user(Some("unknown")).await.unwrap(), None);

        auth.handle_callback(Some("abc"), None).await.unwrap();
        let user = auth.session_user(Some("access-abc")).await.unwrap().unwrap();
        assert_eq!(user.provider_id, "google-42");

        let failing = manager_with(&fake.base_url(), Arc::new(FailingStore));
        assert!(matches!(
            failing.session_user(Some("access-abc")).await,
            Err(AuthError::UserStore(_))
        ));
    }

    #[test]
    fn test_logout_clears_session() {
        let auth = manager("http://127.0.0.1:9");
        let cookie = auth.logout();
        assert_eq!(cookie.name(), cookies::SESSION_COOKIE);
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
