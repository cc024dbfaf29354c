use oauth2::{
    AccessToken, AuthUrl, AuthorizationCode, ClientId, ClientSecret, RedirectUrl, Scope, TokenUrl,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use url::Url;

use crate::models::app_config::AppConfig;
use crate::models::oauth::{TokenResponse, UserInfo};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Client for the identity provider's authorization, token and user-info
/// endpoints.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    http: reqwest::Client,
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    userinfo_url: Url,
    redirect_url: RedirectUrl,
    scopes: Vec<Scope>,
}

impl GoogleProvider {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: &AppConfig) -> Self {
        let provider = &config.provider;
        Self {
            http,
            client_id: ClientId::new(provider.client_id.clone()),
            client_secret: ClientSecret::new(provider.client_secret.clone()),
            auth_url: AuthUrl::from_url(provider.auth_url.clone()),
            token_url: TokenUrl::from_url(provider.token_url.clone()),
            userinfo_url: provider.userinfo_url.clone(),
            redirect_url: RedirectUrl::from_url(config.profile.callback_url.clone()),
            scopes: vec![Scope::new("email".into()), Scope::new("profile".into())],
        }
    }

    pub fn authorization_url(&self) -> Url {
        let scope = self
            .scopes
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mut url = self.auth_url.url().clone();
        url.query_pairs_mut()
            .append_pair("client_id", self.client_id.as_str())
            .append_pair("redirect_uri", self.redirect_url.url().as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &scope)
            .append_pair("access_type", "offline");
        url
    }

    pub async fn exchange_code(
        &self,
        code: &AuthorizationCode,
    ) -> Result<TokenResponse, ProviderError> {
        let params = [
            ("code", code.secret().as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.secret().as_str()),
            ("redirect_uri", self.redirect_url.url().as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(self.token_url.url().clone())
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        Ok(response.json::<TokenResponse>().await?)
    }

    pub async fn fetch_user_info(&self, token: &AccessToken) -> Result<UserInfo, ProviderError> {
        let response = self
            .http
            .get(self.userinfo_url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", token.secret()))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let response = ensure_success(response).await?;
        Ok(response.json::<UserInfo>().await?)
    }
}

async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Error reading response body: {}", e));
    Err(ProviderError::Status { status, body })
}
