use std::net::SocketAddr;
use std::sync::Arc;

use url::Url;

use crate::services::auth_session::AuthSessionManager;
use crate::services::usage::UsageTracker;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4000";
const DEFAULT_MAX_DEVICE_USAGE: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not found")]
    Missing(&'static str),
    #[error("{name} is not a valid absolute URL: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("unknown APP_ENV value {0:?}, expected \"development\" or \"production\"")]
    UnknownEnvironment(String),
    #[error("BIND_ADDR {0:?} is not a socket address")]
    InvalidBindAddr(String),
    #[error("MAX_DEVICE_USAGE {0:?} is not a non-negative integer")]
    InvalidUsageLimit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(tag: Option<&str>) -> Result<Self, ConfigError> {
        match tag.map(str::trim) {
            None | Some("") | Some("development") => Ok(Self::Development),
            Some("production") => Ok(Self::Production),
            Some(other) => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// URLs that differ between deployments.
#[derive(Debug, Clone)]
pub struct EnvironmentProfile {
    /// The server's own OAuth callback endpoint, registered with the provider.
    pub callback_url: Url,
    pub frontend_url: Url,
    /// Post-login target when no redirect intent survived the round trip.
    pub default_redirect: Url,
}

impl EnvironmentProfile {
    /// Variable names paired with their development fallbacks.
    fn variables() -> [(&'static str, &'static str); 3] {
        [
            ("AUTH_CALLBACK_URL", "http://localhost:4000/api/auth/callback"),
            ("FRONTEND_URL", "http://localhost:3000"),
            ("DEFAULT_REDIRECT_URL", "http://localhost:3000/analysis"),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: Url,
    pub token_url: Url,
    pub userinfo_url: Url,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub profile: EnvironmentProfile,
    pub provider: ProviderConfig,
    pub bind_addr: SocketAddr,
    /// Uses allowed per device fingerprint.
    pub max_device_usage: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        use dotenvy::dotenv;
        use std::env;

        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves the whole configuration from `lookup`. Production values have
    /// no fallbacks, so a missing URL fails here rather than on first request.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = Environment::parse(get("APP_ENV").as_deref())?;

        let [callback, frontend, default_redirect] = EnvironmentProfile::variables()
            .map(|(name, fallback)| {
                let value = match environment {
                    Environment::Development => {
                        Some(get(name).unwrap_or_else(|| fallback.to_string()))
                    }
                    Environment::Production => get(name),
                };
                (name, value)
            });

        let profile = EnvironmentProfile {
            callback_url: required_url(callback.0, callback.1)?,
            frontend_url: required_url(frontend.0, frontend.1)?,
            default_redirect: required_url(default_redirect.0, default_redirect.1)?,
        };

        let provider = ProviderConfig {
            client_id: get("GOOGLE_CLIENT_ID")
                .ok_or(ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            client_secret: get("GOOGLE_CLIENT_SECRET")
                .ok_or(ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            auth_url: url_or_default("GOOGLE_AUTH_URL", get("GOOGLE_AUTH_URL"), GOOGLE_AUTH_URL)?,
            token_url: url_or_default(
                "GOOGLE_TOKEN_URL",
                get("GOOGLE_TOKEN_URL"),
                GOOGLE_TOKEN_URL,
            )?,
            userinfo_url: url_or_default(
                "GOOGLE_USERINFO_URL",
                get("GOOGLE_USERINFO_URL"),
                GOOGLE_USERINFO_URL,
            )?,
        };

        let bind = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind.clone()))?;

        let max_device_usage = match get("MAX_DEVICE_USAGE") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidUsageLimit(raw.clone()))?,
            None => DEFAULT_MAX_DEVICE_USAGE,
        };

        Ok(Self {
            environment,
            profile,
            provider,
            bind_addr,
            max_device_usage,
        })
    }

    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Scheme, host and port of the frontend, as browsers send it in `Origin`.
    pub fn frontend_origin(&self) -> String {
        self.profile.frontend_url.origin().ascii_serialization()
    }
}

fn required_url(name: &'static str, value: Option<String>) -> Result<Url, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(name))?;
    Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl { name, source })
}

fn url_or_default(
    name: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<Url, ConfigError> {
    required_url(name, Some(value.unwrap_or_else(|| default.to_string())))
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthSessionManager>,
    pub usage: Arc<UsageTracker>,
}
