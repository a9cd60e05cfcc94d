//! Hand-rolled middleware: request IDs, security headers and a small
//! in-memory rate limiter for the `/api` routes.

use std::{
    collections::HashMap,
    sync::Arc,
    time::Instant,
};

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;

use crate::{api::extractors::ClientIp, error::AppError};

// =====================================
// Request ID
// =====================================

const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Propagate an incoming `X-Request-Id` or mint a fresh one, and echo
/// it on the response for log correlation.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .unwrap_or_else(|| nanoid::nanoid!(12));

    // nanoid output is ASCII, so the header value is always valid.
    if let Ok(value) = HeaderValue::from_str(&id) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());

        let mut response = next.run(request).await;
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
        return response;
    }

    next.run(request).await
}

// =====================================
// Security headers
// =====================================

/// Baseline security headers on every response.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

// =====================================
// Rate limiting
// =====================================

/// Expired counters are swept once the map grows past this many keys,
/// so a stream of never-repeating client addresses cannot grow the map
/// without bound.
const CLEANUP_THRESHOLD: usize = 1024;

/// Fixed-window request counters per client key, held in memory. Good
/// enough for a single-process deployment; entries from expired
/// windows are replaced lazily on the next request and swept in bulk
/// once the map passes [`CLEANUP_THRESHOLD`].
#[derive(Debug, Clone)]
pub struct RateLimiterState {
    requests: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window: std::time::Duration,
}

impl RateLimiterState {
    #[must_use]
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: std::time::Duration::from_secs(window_seconds),
        }
    }

    /// Count one request for `key`.
    ///
    /// # Errors
    /// `RateLimited` once the key's budget for the current window is
    /// spent.
    pub async fn check(&self, key: &str) -> Result<(), AppError> {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        if requests.len() >= CLEANUP_THRESHOLD {
            let window = self.window;
            requests.retain(|_, (_, start)| now.duration_since(*start) <= window);
        }

        let entry = requests.entry(key.to_string()).or_insert((0, now));

        if now.duration_since(entry.1) > self.window {
            *entry = (1, now);
            return Ok(());
        }

        if entry.0 >= self.max_requests {
            return Err(AppError::RateLimited);
        }

        entry.0 += 1;
        Ok(())
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// Middleware wrapper around [`RateLimiterState`], keyed by client IP
/// (unknown clients share one bucket).
pub async fn rate_limit(
    State(limiter): State<RateLimiterState>,
    ClientIp(ip): ClientIp,
    request: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let key = ip.unwrap_or_else(|| "unknown".to_string());
    limiter.check(&key).await?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn limiter_allows_within_budget() {
        let limiter = RateLimiterState::new(3, 60);

        for _ in 0..3 {
            assert!(limiter.check("1.2.3.4").await.is_ok());
        }
        assert!(matches!(
            limiter.check("1.2.3.4").await,
            Err(AppError::RateLimited)
        ));

        // Other keys have their own budget.
        assert!(limiter.check("5.6.7.8").await.is_ok());
    }

    #[tokio::test]
    async fn expired_foreign_keys_are_evicted() {
        // Zero-length window: every counter is expired by the time the
        // next request arrives.
        let limiter = RateLimiterState::new(10, 0);

        for i in 0..(CLEANUP_THRESHOLD * 2) {
            limiter.check(&format!("198.51.100.{i}")).await.ok();
        }

        // A flood of never-repeating keys must not grow the map
        // without bound.
        assert!(limiter.tracked_keys().await <= CLEANUP_THRESHOLD + 1);
    }

    #[tokio::test]
    async fn active_windows_survive_the_sweep() {
        let limiter = RateLimiterState::new(10, 60);
        limiter.check("1.2.3.4").await.unwrap();

        for i in 0..(CLEANUP_THRESHOLD * 2) {
            limiter.check(&format!("198.51.100.{i}")).await.ok();
        }

        // The original key's window has not passed, so its counter is
        // still tracked and still accumulating.
        for _ in 0..9 {
            assert!(limiter.check("1.2.3.4").await.is_ok());
        }
        assert!(matches!(
            limiter.check("1.2.3.4").await,
            Err(AppError::RateLimited)
        ));
    }
}
