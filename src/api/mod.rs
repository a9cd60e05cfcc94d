//! HTTP layer: router assembly, handlers, extractors and middleware.
//!
//! Routes:
//! - `GET  /:code`                     - redirect (302) and click record
//! - `POST /api/links`                 - create a short link
//! - `GET  /api/links?owner=...`       - list links
//! - `GET  /api/links/:code`           - link detail
//! - `GET  /api/links/:code/stats`     - click analytics
//! - `GET  /api/links/:code/clicks.csv`- raw click export
//! - `GET  /api/links/:code/qr.svg`    - QR image of the short URL
//! - `GET  /api/stats`                 - system totals
//! - `GET  /health`                    - liveness

mod extractors;
mod handlers;
mod middleware;

pub use extractors::*;
pub use handlers::*;
pub use middleware::*;

use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{config::Config, database::Database, services::AppState};

/// Assemble the full application router.
pub fn create_router(db: Database, config: Config) -> Router {
    let limiter = RateLimiterState::new(
        config.rate_limit_per_window,
        config.rate_limit_window_secs,
    );
    let state = AppState::new(db, config);

    Router::new()
        // The redirect route sits at the root so short URLs stay short.
        .route("/:code", get(handlers::link::redirect_handler))
        .nest("/api", api_routes(limiter))
        .route("/health", get(handlers::health::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .layer(axum_middleware::from_fn(middleware::request_id))
        .layer(axum_middleware::from_fn(middleware::security_headers))
        .with_state(state)
}

/// `/api` subtree, rate limited per client.
fn api_routes(limiter: RateLimiterState) -> Router<AppState> {
    Router::new()
        .nest("/links", link_routes())
        .route("/stats", get(handlers::stats::system_stats))
        .layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit,
        ))
}

fn link_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handlers::link::create_link).get(handlers::link::list_links),
        )
        .route("/:code", get(handlers::link::get_link))
        .route("/:code/stats", get(handlers::stats::link_stats))
        .route("/:code/clicks.csv", get(handlers::stats::clicks_csv))
        .route("/:code/qr.svg", get(handlers::link::qr_image))
}
