//! Error types for the whole service and their mapping onto HTTP
//! responses. Handlers return [`Result<T>`] and the `IntoResponse` impl
//! turns any [`AppError`] into a JSON error body with the right status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Service-wide result alias.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or unsupported destination URL - 400.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Malformed request body or parameters - 400.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unknown short code (or other missing resource) - 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Owner has reached their link quota - 402.
    #[error("Plan limit reached: at most {0} links on the current plan")]
    PlanLimitReached(u32),

    /// Client exceeded the request budget - 429.
    #[error("Too many requests")]
    RateLimited,

    /// The bounded code-generation retry budget ran out - 500.
    #[error("Short-code space exhausted after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    /// QR rendering failed - 500.
    #[error("QR rendering error: {0}")]
    Qr(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistence failure, converted automatically from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PlanLimitReached(_) => StatusCode::PAYMENT_REQUIRED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            Self::GenerationExhausted { .. }
            | Self::Qr(_)
            | Self::Internal(_)
            | Self::Server(_)
            | Self::Config(_)
            | Self::Database(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Standard error for an unknown short code.
    #[must_use]
    pub fn link_not_found(code: &str) -> Self {
        Self::NotFound(format!("link '{}' not found", code))
    }
}

// =====================================
// Error response body
// =====================================

/// JSON body for error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable label, e.g. "Not Found".
    pub error: String,

    /// Human-readable message.
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_code = Some(status.as_u16());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(error = %self, "server error");
        }

        let status = self.status_code();
        let body = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            self.to_string(),
        )
        .with_status(status);

        (status, Json(body)).into_response()
    }
}

// =====================================
// Conversions
// =====================================

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        // Only failures on the destination URL itself are URL errors;
        // anything else (owner_id bounds etc.) is a plain bad request.
        if err.field_errors().contains_key("destination_url") {
            AppError::InvalidUrl(err.to_string())
        } else {
            AppError::BadRequest(err.to_string())
        }
    }
}

// =====================================
// Extension helpers
// =====================================

/// Map arbitrary errors into [`AppError`] without losing the message.
pub trait ResultExt<T, E> {
    /// Convert the error into `AppError::Internal`.
    fn map_internal(self) -> Result<T>;

    /// Convert the error with a custom mapping.
    fn map_app_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(E) -> AppError;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for std::result::Result<T, E> {
    fn map_internal(self) -> Result<T> {
        self.map_err(|e| AppError::Internal(e.to_string()))
    }

    fn map_app_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(E) -> AppError,
    {
        self.map_err(f)
    }
}

/// Turn `None` into a 404.
pub trait OptionExt<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::InvalidUrl("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::link_not_found("abc").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::PlanLimitReached(3).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::GenerationExhausted { attempts: 15 }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_error_detection() {
        assert!(AppError::Internal("x".to_string()).is_server_error());
        assert!(!AppError::link_not_found("abc").is_server_error());
    }

    #[test]
    fn option_extension() {
        let some: Option<i32> = Some(42);
        let none: Option<i32> = None;

        assert!(some.ok_or_not_found("missing").is_ok());
        assert!(matches!(
            none.ok_or_not_found("missing"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn result_extension() {
        let err: std::result::Result<i32, &str> = Err("boom");
        assert!(matches!(err.map_internal(), Err(AppError::Internal(_))));

        let err: std::result::Result<i32, &str> = Err("boom");
        let mapped = err.map_app_err(|e| AppError::Qr(e.to_string()));
        assert!(matches!(mapped, Err(AppError::Qr(_))));
    }
}
