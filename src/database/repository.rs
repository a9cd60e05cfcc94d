//! Repositories over the `links` and `clicks` tables. All SQL in the
//! service lives here; the service layer only sees domain types.

use chrono::Utc;

use super::Database;
use crate::{
    error::{AppError, Result},
    models::{ClickEvent, CreateLink, DayCount, DeviceSplit, LinkWithClicks, RecordClick,
        SmartLink, SystemStats},
};

// =====================================
// Links
// =====================================

/// What a single insert attempt decided, all inside one statement.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(SmartLink),

    /// The code is already taken; retry with a fresh one.
    CodeTaken,

    /// The owner is at their link quota; nothing was inserted.
    QuotaExceeded,
}

#[derive(Debug, Clone)]
pub struct LinkRepository {
    db: Database,
}

impl LinkRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Atomic check-and-insert. The `UNIQUE(code)` constraint is the
    /// only uniqueness guard; a collision with a concurrently inserted
    /// code surfaces as a unique violation and is reported as
    /// [`InsertOutcome::CodeTaken`] so the caller can retry with a
    /// fresh code. When `owner_quota` is set, the owner's link count
    /// is checked inside the same statement, so two concurrent creates
    /// cannot both slip under the limit.
    pub async fn try_insert(
        &self,
        link: &CreateLink,
        owner_quota: Option<u32>,
    ) -> Result<InsertOutcome> {
        let now = Utc::now();

        let result = match owner_quota {
            Some(max) => {
                sqlx::query(
                    r#"
                    INSERT INTO links (id, code, destination_url, owner_id, created_at)
                    SELECT ?, ?, ?, ?, ?
                    WHERE (SELECT COUNT(*) FROM links WHERE owner_id = ?) < ?
                    "#,
                )
                .bind(&link.id)
                .bind(&link.code)
                .bind(&link.destination_url)
                .bind(&link.owner_id)
                .bind(now)
                .bind(&link.owner_id)
                .bind(max)
                .execute(self.db.pool())
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO links (id, code, destination_url, owner_id, created_at)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&link.id)
                .bind(&link.code)
                .bind(&link.destination_url)
                .bind(&link.owner_id)
                .bind(now)
                .execute(self.db.pool())
                .await
            }
        };

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(InsertOutcome::QuotaExceeded),
            Ok(_) => {
                let inserted = self.find_by_code(&link.code).await?.ok_or_else(|| {
                    AppError::Internal("inserted link not found on readback".to_string())
                })?;
                Ok(InsertOutcome::Inserted(inserted))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertOutcome::CodeTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<SmartLink>> {
        let link = sqlx::query_as::<_, SmartLink>(
            r#"
            SELECT id, code, destination_url, owner_id, created_at
            FROM links
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(link)
    }

    pub async fn exists(&self, code: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i32>("SELECT COUNT(*) FROM links WHERE code = ?")
            .bind(code)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count > 0)
    }

    /// Links with their click counts, newest first, optionally scoped
    /// to one owner.
    pub async fn list(&self, owner_id: Option<&str>) -> Result<Vec<LinkWithClicks>> {
        let base = r#"
            SELECT l.id, l.code, l.destination_url, l.owner_id, l.created_at,
                   COUNT(c.id) AS clicks
            FROM links l
            LEFT JOIN clicks c ON c.link_code = l.code
        "#;

        let links = match owner_id {
            Some(owner) => {
                sqlx::query_as::<_, LinkWithClicks>(&format!(
                    "{base} WHERE l.owner_id = ? GROUP BY l.id ORDER BY l.created_at DESC"
                ))
                .bind(owner)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query_as::<_, LinkWithClicks>(&format!(
                    "{base} GROUP BY l.id ORDER BY l.created_at DESC"
                ))
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(links)
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM links")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

// =====================================
// Clicks
// =====================================

#[derive(Debug, Clone)]
pub struct ClickRepository {
    db: Database,
}

impl ClickRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append one click event. Rows are never updated or deleted.
    pub async fn insert(&self, click: &RecordClick) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO clicks (link_code, referrer, ip_hash, user_agent, device, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&click.link_code)
        .bind(&click.referrer)
        .bind(&click.ip_hash)
        .bind(&click.user_agent)
        .bind(click.device)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn count_for(&self, code: &str) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clicks WHERE link_code = ?")
                .bind(code)
                .fetch_one(self.db.pool())
                .await?;

        Ok(count)
    }

    /// Calendar-day buckets for one link, oldest first.
    pub async fn count_by_day(&self, code: &str) -> Result<Vec<DayCount>> {
        let buckets = sqlx::query_as::<_, DayCount>(
            r#"
            SELECT date(created_at) AS day, COUNT(*) AS clicks
            FROM clicks
            WHERE link_code = ?
            GROUP BY date(created_at)
            ORDER BY day
            "#,
        )
        .bind(code)
        .fetch_all(self.db.pool())
        .await?;

        Ok(buckets)
    }

    /// Mobile/desktop breakdown for one link.
    pub async fn device_split(&self, code: &str) -> Result<DeviceSplit> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT device, COUNT(*)
            FROM clicks
            WHERE link_code = ?
            GROUP BY device
            "#,
        )
        .bind(code)
        .fetch_all(self.db.pool())
        .await?;

        let mut split = DeviceSplit::default();
        for (device, count) in rows {
            match device.as_str() {
                "mobile" => split.mobile = count,
                _ => split.desktop = count,
            }
        }

        Ok(split)
    }

    /// Full click log for one link, oldest first (CSV export).
    pub async fn list_for(&self, code: &str) -> Result<Vec<ClickEvent>> {
        let clicks = sqlx::query_as::<_, ClickEvent>(
            r#"
            SELECT id, link_code, referrer, ip_hash, user_agent, device, created_at
            FROM clicks
            WHERE link_code = ?
            ORDER BY created_at
            "#,
        )
        .bind(code)
        .fetch_all(self.db.pool())
        .await?;

        Ok(clicks)
    }

    pub async fn total(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clicks")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

// =====================================
// Cross-table stats
// =====================================

impl LinkRepository {
    /// System-wide totals for the admin stats endpoint.
    pub async fn system_stats(&self) -> Result<SystemStats> {
        let stats = sqlx::query_as::<_, SystemStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM links)  AS total_links,
                (SELECT COUNT(*) FROM clicks) AS total_clicks
            "#,
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(stats)
    }
}
