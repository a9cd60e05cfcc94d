//! Custom axum extractors used by the handlers.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{error::AppError, models::Visitor};

// =====================================
// Client IP
// =====================================

/// Best-effort client address: `X-Forwarded-For` first (the service
/// normally sits behind a proxy), then `X-Real-IP`. `None` when
/// neither header is present.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let ip = parts
            .headers
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get("X-Real-IP")
                    .and_then(|v| v.to_str().ok())
                    .map(ToString::to_string)
            });

        Ok(ClientIp(ip))
    }
}

// =====================================
// Visitor details for click events
// =====================================

/// Everything the redirect handler records about a visitor: referrer,
/// user agent and client IP. Never rejects; absent headers become
/// `None`.
#[derive(Debug, Clone)]
pub struct VisitorInfo(pub Visitor);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for VisitorInfo {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ClientIp(ip) = ClientIp::from_request_parts(parts, state).await?;

        let referrer = parts
            .headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        Ok(VisitorInfo(Visitor {
            referrer,
            ip,
            user_agent,
        }))
    }
}

// =====================================
// Validated JSON body
// =====================================

/// `Json<T>` plus `validator` checks in one extractor, so handlers
/// only ever see well-formed payloads.
///
/// ```rust,ignore
/// async fn handler(ValidatedJson(body): ValidatedJson<CreateLinkRequest>) -> ... {
///     // body passed validation
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::BadRequest(format!("invalid JSON: {e}")))?;

        data.validate()?;

        Ok(ValidatedJson(data))
    }
}
