use serde::Serialize;
use time::OffsetDateTime;

/// Persistent account record, unique per provider id.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    #[serde(rename = "googleId")]
    pub provider_id: String,
    pub email: String,
    pub name: String,
    pub avatar: String,
    /// Uses recorded while this account was signed in.
    pub total_analyses: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_login: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Uses recorded against one device fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUsage {
    pub device_id: String,
    pub usage_count: u32,
    pub last_used: Option<OffsetDateTime>,
}

impl DeviceUsage {
    pub fn unused(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            usage_count: 0,
            last_used: None,
        }
    }
}
