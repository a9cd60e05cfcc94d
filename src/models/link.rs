//! The SmartLink entity and its request/response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::config::Config;

// =====================================
// Entity
// =====================================

/// A short-code-to-destination mapping as stored in the `links` table.
///
/// `code` is globally unique (enforced by the database) and immutable
/// once assigned; nothing in the service updates a link in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SmartLink {
    pub id: String,

    /// URL-safe short code, 6-8 alphanumerics.
    pub code: String,

    pub destination_url: String,

    /// Opaque owner handle; links created anonymously have none.
    pub owner_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl SmartLink {
    /// The shareable short URL for this link.
    #[must_use]
    pub fn short_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.code)
    }
}

/// Internal payload handed to the repository on insert.
#[derive(Debug, Clone)]
pub struct CreateLink {
    pub id: String,
    pub code: String,
    pub destination_url: String,
    pub owner_id: Option<String>,
}

/// A link joined with its click count, as returned by list queries.
#[derive(Debug, Clone, FromRow)]
pub struct LinkWithClicks {
    pub id: String,
    pub code: String,
    pub destination_url: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub clicks: i64,
}

// =====================================
// Request DTO
// =====================================

/// Body of `POST /api/links`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Where the short link should point.
    #[validate(url(message = "destination_url must be a valid URL"))]
    #[validate(length(max = 2048, message = "destination_url is too long"))]
    pub destination_url: String,

    /// Optional owner handle the link is filed under.
    #[validate(length(min = 1, max = 64, message = "owner_id must be 1-64 characters"))]
    pub owner_id: Option<String>,
}

// =====================================
// Response DTO
// =====================================

/// Link representation sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResponse {
    pub id: String,
    pub code: String,
    pub short_url: String,
    pub qr_image_url: String,
    pub destination_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    pub clicks: i64,
    pub created_at: DateTime<Utc>,
}

impl LinkResponse {
    #[must_use]
    pub fn from_link(link: &SmartLink, clicks: i64, config: &Config) -> Self {
        Self {
            id: link.id.clone(),
            code: link.code.clone(),
            short_url: config.short_url(&link.code),
            qr_image_url: config.qr_image_url(&link.code),
            destination_url: link.destination_url.clone(),
            owner_id: link.owner_id.clone(),
            clicks,
            created_at: link.created_at,
        }
    }

    #[must_use]
    pub fn from_link_with_clicks(link: &LinkWithClicks, config: &Config) -> Self {
        Self {
            id: link.id.clone(),
            code: link.code.clone(),
            short_url: config.short_url(&link.code),
            qr_image_url: config.qr_image_url(&link.code),
            destination_url: link.destination_url.clone(),
            owner_id: link.owner_id.clone(),
            clicks: link.clicks,
            created_at: link.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    fn sample_link() -> SmartLink {
        SmartLink {
            id: "id123".to_string(),
            code: "aZ3kq1".to_string(),
            destination_url: "https://zillow.com/home/123".to_string(),
            owner_id: Some("agent-7".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn short_url_formatting() {
        let link = sample_link();
        assert_eq!(
            link.short_url("https://sl.example/"),
            "https://sl.example/aZ3kq1"
        );
    }

    #[test]
    fn response_carries_qr_url() {
        let config = ConfigBuilder::new().base_url("https://sl.example").build();
        let response = LinkResponse::from_link(&sample_link(), 3, &config);

        assert_eq!(response.short_url, "https://sl.example/aZ3kq1");
        assert_eq!(
            response.qr_image_url,
            "https://sl.example/api/links/aZ3kq1/qr.svg"
        );
        assert_eq!(response.clicks, 3);
    }

    #[test]
    fn request_validation() {
        let ok = CreateLinkRequest {
            destination_url: "https://example.com".to_string(),
            owner_id: None,
        };
        assert!(ok.validate().is_ok());

        let bad = CreateLinkRequest {
            destination_url: "not a url".to_string(),
            owner_id: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn validation_failures_map_to_the_right_error() {
        use crate::error::AppError;

        let bad_owner = CreateLinkRequest {
            destination_url: "https://example.com".to_string(),
            owner_id: Some("x".repeat(65)),
        };
        let err = AppError::from(bad_owner.validate().unwrap_err());
        assert!(matches!(err, AppError::BadRequest(_)));

        let bad_url = CreateLinkRequest {
            destination_url: "not a url".to_string(),
            owner_id: None,
        };
        let err = AppError::from(bad_url.validate().unwrap_err());
        assert!(matches!(err, AppError::InvalidUrl(_)));
    }
}
