//! Business logic, one service per concern, wired together in
//! [`AppState`] and shared across handlers.
//!
//! ```text
//! ┌─────────────────┐
//! │    API layer    │  axum handlers
//! ├─────────────────┤
//! │  Service layer  │  link / analytics / qr (here)
//! ├─────────────────┤
//! │  Repositories   │  all SQL
//! ├─────────────────┤
//! │     SQLite      │
//! └─────────────────┘
//! ```

mod analytics_service;
mod link_service;
mod qr_service;

pub use analytics_service::*;
pub use link_service::*;
pub use qr_service::*;

use std::sync::Arc;

use crate::{
    config::Config,
    database::{ClickRepository, Database, LinkRepository},
};

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Database,
    pub link_service: Arc<LinkService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub qr_service: Arc<QrService>,
}

impl AppState {
    #[must_use]
    pub fn new(db: Database, config: Config) -> Self {
        let links = LinkRepository::new(db.clone());
        let clicks = ClickRepository::new(db.clone());

        let config = Arc::new(config);

        let link_service = Arc::new(LinkService::new(
            links.clone(),
            clicks.clone(),
            config.clone(),
        ));
        let analytics_service = Arc::new(AnalyticsService::new(links, clicks));
        let qr_service = Arc::new(QrService::new(config.clone()));

        Self {
            config,
            database: db,
            link_service,
            analytics_service,
            qr_service,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
