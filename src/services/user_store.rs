use std::collections::HashMap;

use async_trait::async_trait;
use oauth2::AccessToken;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::models::oauth::UserInfo;
use crate::models::user::{DeviceUsage, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for user records and the session token last issued to each.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates or refreshes the record for `info.id` and binds `token` to it.
    async fn upsert_login(
        &self,
        info: &UserInfo,
        token: &AccessToken,
    ) -> Result<User, StoreError>;

    async fn find_by_session(&self, token: &str) -> Result<Option<User>, StoreError>;

    async fn device_usage(&self, device_id: &str) -> Result<DeviceUsage, StoreError>;

    /// Counts one use against `device_id` unless it already reached `limit`,
    /// in which case `None` is returned and nothing changes. A use made
    /// under a known `session_token` is also added to that user's total.
    async fn record_device_use(
        &self,
        device_id: &str,
        limit: u32,
        session_token: Option<&str>,
    ) -> Result<Option<DeviceUsage>, StoreError>;
}

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: HashMap<String, User>,
    sessions: HashMap<String, String>,
    tokens_by_user: HashMap<String, String>,
    devices: HashMap<String, DeviceUsage>,
}

#[derive(Default)]
pub struct MemoryUserStore {
    tables: RwLock<Tables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn upsert_login(
        &self,
        info: &UserInfo,
        token: &AccessToken,
    ) -> Result<User, StoreError> {
        let now = OffsetDateTime::now_utc();
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let user = match tables.users.get_mut(&info.id) {
            Some(existing) => {
                existing.email = info.email.clone();
                existing.name = info.name.clone();
                existing.avatar = info.picture.clone();
                existing.last_login = now;
                existing.clone()
            }
            None => {
                tables.next_id += 1;
                let user = User {
                    id: tables.next_id,
                    provider_id: info.id.clone(),
                    email: info.email.clone(),
                    name: info.name.clone(),
                    avatar: info.picture.clone(),
                    total_analyses: 0,
                    last_login: now,
                    created_at: now,
                };
                tables.users.insert(info.id.clone(), user.clone());
                user
            }
        };

        if let Some(previous) = tables
            .tokens_by_user
            .insert(info.id.clone(), token.secret().clone())
        {
            tables.sessions.remove(&previous);
        }
        tables
            .sessions
            .insert(token.secret().clone(), info.id.clone());

        Ok(user)
    }

    async fn find_by_session(&self, token: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .get(token)
            .and_then(|provider_id| tables.users.get(provider_id))
            .cloned())
    }

    async fn device_usage(&self, device_id: &str) -> Result<DeviceUsage, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .devices
            .get(device_id)
            .cloned()
            .unwrap_or_else(|| DeviceUsage::unused(device_id)))
    }

    async fn record_device_use(
        &self,
        device_id: &str,
        limit: u32,
        session_token: Option<&str>,
    ) -> Result<Option<DeviceUsage>, StoreError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let usage = tables
            .devices
            .entry(device_id.to_string())
            .or_insert_with(|| DeviceUsage::unused(device_id));
        if usage.usage_count >= limit {
            return Ok(None);
        }
        usage.usage_count += 1;
        usage.last_used = Some(OffsetDateTime::now_utc());
        let usage = usage.clone();

        if let Some(user) = session_token
            .and_then(|token| tables.sessions.get(token))
            .and_then(|provider_id| tables.users.get_mut(provider_id))
        {
            user.total_analyses += 1;
        }

        Ok(Some(usage))
    }
}
