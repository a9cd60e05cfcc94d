//! # SmartLinks
//!
//! A short-link service with QR images and click analytics:
//! submit a destination URL, get back a compact code, a shareable
//! short URL and a QR image; every redirect is recorded as an
//! append-only click event and aggregated per day.
//!
//! ```text
//! src/
//! ├── lib.rs          # library entry point
//! ├── main.rs         # binary entry point
//! ├── config/         # environment configuration
//! ├── error/          # error types and HTTP mapping
//! ├── database/       # pool, migrations, repositories
//! ├── models/         # entities and DTOs
//! ├── services/       # business logic
//! ├── api/            # router, handlers, middleware
//! └── utils/          # code generation, validation, hashing
//! ```

pub mod config;
pub mod error;
pub mod database;
pub mod models;
pub mod services;
pub mod api;
pub mod utils;

pub use error::{AppError, Result};

/// Commonly used items, importable in one line.
///
/// ```rust
/// use smartlinks::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::database::Database;
    pub use crate::error::{AppError, Result};
    pub use crate::models::*;
    pub use crate::services::*;
}
