//! Database layer: SQLite connection pool, migrations and the
//! repositories that encapsulate every query in the service.

mod repository;

pub use repository::*;

use std::sync::Arc;

use sqlx::{
    migrate::Migrator,
    sqlite::{SqlitePool, SqlitePoolOptions},
};

use crate::error::Result;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Shared handle to the connection pool. Cloning is cheap (Arc bump).
#[derive(Debug, Clone)]
pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    /// Open a pool against the given sqlx URL, creating the parent
    /// directory for file-backed SQLite databases.
    ///
    /// # Errors
    /// Fails if the directory cannot be created or the pool cannot
    /// connect.
    pub async fn connect(database_url: impl AsRef<str>) -> Result<Self> {
        let url = database_url.as_ref();
        if let Some(path) = url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if let Some(parent) = std::path::Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .idle_timeout(std::time::Duration::from_secs(600))
            .connect(url)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&*self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap liveness probe used by the health endpoint.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&*self.pool).await?;
        Ok(())
    }

    /// Fresh in-memory database with migrations applied. A single
    /// connection keeps the `:memory:` store alive for the pool's
    /// lifetime. Used by the test suites.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self {
            pool: Arc::new(pool),
        };
        db.migrate().await?;
        Ok(db)
    }
}
