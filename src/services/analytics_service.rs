//! Read-side aggregation over the click log. Nothing in this module
//! mutates state.

use tracing::instrument;

use crate::{
    database::{ClickRepository, LinkRepository},
    error::{AppError, Result, ResultExt},
    models::{StatsResponse, SystemStats},
};

#[derive(Debug, Clone)]
pub struct AnalyticsService {
    links: LinkRepository,
    clicks: ClickRepository,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(links: LinkRepository, clicks: ClickRepository) -> Self {
        Self { links, clicks }
    }

    /// Total clicks, per-day buckets and device split for one link.
    ///
    /// # Errors
    /// `NotFound` for unknown codes; a link with zero clicks gets an
    /// empty breakdown, not an error.
    #[instrument(skip(self))]
    pub async fn link_stats(&self, code: &str) -> Result<StatsResponse> {
        if !self.links.exists(code).await? {
            return Err(AppError::link_not_found(code));
        }

        let total_clicks = self.clicks.count_for(code).await?;
        let by_day = self.clicks.count_by_day(code).await?;
        let devices = self.clicks.device_split(code).await?;

        Ok(StatsResponse {
            code: code.to_string(),
            total_clicks,
            by_day,
            devices,
        })
    }

    /// Raw click log for one link as CSV, oldest first. Columns match
    /// what spreadsheet users expect: one row per click.
    #[instrument(skip(self))]
    pub async fn clicks_csv(&self, code: &str) -> Result<String> {
        if !self.links.exists(code).await? {
            return Err(AppError::link_not_found(code));
        }

        let events = self.clicks.list_for(code).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["timestamp", "referrer", "ip_hash", "user_agent", "device"])
            .map_internal()?;

        for event in &events {
            writer
                .write_record([
                    event.created_at.to_rfc3339().as_str(),
                    event.referrer.as_deref().unwrap_or(""),
                    event.ip_hash.as_deref().unwrap_or(""),
                    event.user_agent.as_deref().unwrap_or(""),
                    event.device.as_str(),
                ])
                .map_internal()?;
        }

        let bytes = writer.into_inner().map_internal()?;
        String::from_utf8(bytes).map_internal()
    }

    /// System-wide totals.
    pub async fn system_stats(&self) -> Result<SystemStats> {
        self.links.system_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::Database,
        models::{CreateLink, Device, RecordClick},
    };

    async fn setup() -> (AnalyticsService, ClickRepository) {
        let db = Database::in_memory().await.unwrap();
        let links = LinkRepository::new(db.clone());
        let clicks = ClickRepository::new(db);

        links
            .try_insert(
                &CreateLink {
                    id: nanoid::nanoid!(21),
                    code: "aZ3kq1".to_string(),
                    destination_url: "https://example.com".to_string(),
                    owner_id: None,
                },
                None,
            )
            .await
            .unwrap();

        (AnalyticsService::new(links, clicks.clone()), clicks)
    }

    fn click(device: Device, referrer: Option<&str>) -> RecordClick {
        RecordClick {
            link_code: "aZ3kq1".to_string(),
            referrer: referrer.map(ToString::to_string),
            ip_hash: Some("deadbeef".to_string()),
            user_agent: Some("test-agent".to_string()),
            device,
        }
    }

    #[tokio::test]
    async fn stats_for_fresh_link_are_empty() {
        let (analytics, _) = setup().await;

        let stats = analytics.link_stats("aZ3kq1").await.unwrap();
        assert_eq!(stats.total_clicks, 0);
        assert!(stats.by_day.is_empty());
        assert_eq!(stats.devices.mobile + stats.devices.desktop, 0);
    }

    #[tokio::test]
    async fn stats_aggregate_clicks() {
        let (analytics, clicks) = setup().await;

        for _ in 0..3 {
            clicks.insert(&click(Device::Mobile, None)).await.unwrap();
        }
        clicks
            .insert(&click(Device::Desktop, Some("https://google.com")))
            .await
            .unwrap();

        let stats = analytics.link_stats("aZ3kq1").await.unwrap();
        assert_eq!(stats.total_clicks, 4);
        assert_eq!(stats.devices.mobile, 3);
        assert_eq!(stats.devices.desktop, 1);
        assert_eq!(stats.by_day.iter().map(|d| d.clicks).sum::<i64>(), 4);
    }

    #[tokio::test]
    async fn stats_for_unknown_code_is_not_found() {
        let (analytics, _) = setup().await;

        let err = analytics.link_stats("zzzzzz").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn csv_export_has_header_and_rows() {
        let (analytics, clicks) = setup().await;
        clicks
            .insert(&click(Device::Desktop, Some("https://google.com")))
            .await
            .unwrap();

        let csv = analytics.clicks_csv("aZ3kq1").await.unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "timestamp,referrer,ip_hash,user_agent,device"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("https://google.com"));
        assert!(row.ends_with("desktop"));
        assert!(lines.next().is_none());
    }
}
