//! Shared API envelope and statistics DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// =====================================
// Envelope
// =====================================

/// Uniform success envelope for JSON endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// =====================================
// Health
// =====================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: bool,
}

impl HealthResponse {
    #[must_use]
    pub fn healthy(database_ok: bool) -> Self {
        Self {
            status: if database_ok { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database_ok,
        }
    }
}

// =====================================
// Analytics
// =====================================

/// Clicks in one calendar-day bucket.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct DayCount {
    /// ISO date, e.g. `2026-08-28`.
    pub day: String,
    pub clicks: i64,
}

/// Mobile/desktop breakdown for one link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceSplit {
    pub mobile: i64,
    pub desktop: i64,
}

/// Body of `GET /api/links/{code}/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub code: String,
    pub total_clicks: i64,
    pub by_day: Vec<DayCount>,
    pub devices: DeviceSplit,
}

/// Body of `GET /api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SystemStats {
    pub total_links: i64,
    pub total_clicks: i64,
}

// =====================================
// Query parameters
// =====================================

/// Query string of `GET /api/links`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Restrict the listing to one owner.
    #[serde(default)]
    pub owner: Option<String>,
}
