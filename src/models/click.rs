//! Click events: one row per served redirect, append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Coarse device class derived from the User-Agent at click time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Device {
    Mobile,
    Desktop,
}

impl Device {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Mobile => "mobile",
            Device::Desktop => "desktop",
        }
    }
}

/// One recorded redirect. Referrer and hashed IP are best-effort; the
/// raw visitor address is never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClickEvent {
    pub id: i64,

    /// Short code of the link that was followed.
    pub link_code: String,

    pub referrer: Option<String>,
    pub ip_hash: Option<String>,
    pub user_agent: Option<String>,
    pub device: Device,
    pub created_at: DateTime<Utc>,
}

/// Payload handed to the repository when a redirect is served.
#[derive(Debug, Clone)]
pub struct RecordClick {
    pub link_code: String,
    pub referrer: Option<String>,
    pub ip_hash: Option<String>,
    pub user_agent: Option<String>,
    pub device: Device,
}

/// What the redirect handler knows about the visitor. Everything is
/// optional; a click with no headers at all is still recorded.
#[derive(Debug, Clone, Default)]
pub struct Visitor {
    pub referrer: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_labels() {
        assert_eq!(Device::Mobile.as_str(), "mobile");
        assert_eq!(Device::Desktop.as_str(), "desktop");
    }

    #[test]
    fn device_serializes_lowercase() {
        let json = serde_json::to_string(&Device::Mobile).unwrap();
        assert_eq!(json, "\"mobile\"");
    }
}
