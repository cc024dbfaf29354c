use std::sync::Arc;

use crate::error::AuthError;
use crate::models::oauth::UsageStats;
use crate::models::user::DeviceUsage;
use crate::services::user_store::UserStore;

/// Per-device use counter capped at a configured maximum.
pub struct UsageTracker {
    users: Arc<dyn UserStore>,
    max_usage: u32,
}

impl UsageTracker {
    pub fn new(users: Arc<dyn UserStore>, max_usage: u32) -> Self {
        Self { users, max_usage }
    }

    pub async fn stats(&self, device_id: Option<&str>) -> Result<UsageStats, AuthError> {
        let device_id = require_device_id(device_id)?;
        let usage = self.users.device_usage(device_id).await?;
        Ok(self.report(usage))
    }

    /// Counts one use for the device. Once the device is at the limit the
    /// counter is left alone and `UsageExhausted` is returned.
    pub async fn record_use(
        &self,
        device_id: Option<&str>,
        session_token: Option<&str>,
    ) -> Result<UsageStats, AuthError> {
        let device_id = require_device_id(device_id)?;
        let usage = self
            .users
            .record_device_use(device_id, self.max_usage, session_token)
            .await?
            .ok_or(AuthError::UsageExhausted)?;

        tracing::debug!(
            device_id = %usage.device_id,
            usage_count = usage.usage_count,
            signed_in = session_token.is_some(),
            "Recorded device use"
        );
        Ok(self.report(usage))
    }

    fn report(&self, usage: DeviceUsage) -> UsageStats {
        UsageStats {
            remaining_usage: self.max_usage.saturating_sub(usage.usage_count),
            max_usage: self.max_usage,
            usage_count: usage.usage_count,
            last_used: usage.last_used,
            device_id: usage.device_id,
        }
    }
}

fn require_device_id(device_id: Option<&str>) -> Result<&str, AuthError> {
    device_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(AuthError::MissingDeviceId)
}
