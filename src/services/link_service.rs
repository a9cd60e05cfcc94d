//! Link creation and redirect resolution.

use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::{
    config::Config,
    database::{ClickRepository, InsertOutcome, LinkRepository},
    error::{AppError, OptionExt, Result},
    models::{CreateLink, CreateLinkRequest, Id, LinkResponse, RecordClick, SmartLink, Visitor},
    utils,
};

/// How often a single code length is tried before widening. Collisions
/// on a 62^6 space are vanishingly rare, so this budget is generous.
const ATTEMPTS_PER_LENGTH: u32 = 5;

#[derive(Debug, Clone)]
pub struct LinkService {
    links: LinkRepository,
    clicks: ClickRepository,
    config: Arc<Config>,
}

impl LinkService {
    #[must_use]
    pub fn new(links: LinkRepository, clicks: ClickRepository, config: Arc<Config>) -> Self {
        Self {
            links,
            clicks,
            config,
        }
    }

    /// Create a new short link for a destination URL.
    ///
    /// # Errors
    /// - `InvalidUrl` if the destination is malformed or not http(s)
    /// - `PlanLimitReached` if the owner's quota is used up
    /// - `GenerationExhausted` if no free code was found within the
    ///   bounded retry budget
    #[instrument(skip(self, request), fields(destination = %request.destination_url))]
    pub async fn create_link(&self, request: CreateLinkRequest) -> Result<LinkResponse> {
        request.validate()?;

        if !utils::is_valid_url(&request.destination_url) {
            return Err(AppError::InvalidUrl(format!(
                "'{}' is not an http(s) URL",
                request.destination_url
            )));
        }

        let link = self.insert_with_fresh_code(&request).await?;

        info!(code = %link.code, "created link");

        Ok(LinkResponse::from_link(&link, 0, &self.config))
    }

    /// Resolve a code for a redirect, recording the click first.
    ///
    /// The click row is written before the response goes out, so a
    /// link's click count always equals the number of redirects that
    /// were actually served.
    #[instrument(skip(self, visitor))]
    pub async fn resolve(&self, code: &str, visitor: Visitor) -> Result<String> {
        let link = self
            .links
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::link_not_found(code))?;

        let device = utils::classify_device(visitor.user_agent.as_deref());
        self.clicks
            .insert(&RecordClick {
                link_code: link.code.clone(),
                referrer: visitor.referrer,
                ip_hash: visitor.ip.as_deref().map(utils::hash_ip),
                user_agent: visitor.user_agent,
                device,
            })
            .await?;

        Ok(link.destination_url)
    }

    /// Link detail with its current click count.
    #[instrument(skip(self))]
    pub async fn get_link(&self, code: &str) -> Result<LinkResponse> {
        let link = self
            .links
            .find_by_code(code)
            .await?
            .ok_or_not_found(format!("link '{}' not found", code))?;

        let clicks = self.clicks.count_for(code).await?;

        Ok(LinkResponse::from_link(&link, clicks, &self.config))
    }

    /// All links, or one owner's links, newest first.
    pub async fn list_links(&self, owner_id: Option<&str>) -> Result<Vec<LinkResponse>> {
        let links = self.links.list(owner_id).await?;

        Ok(links
            .iter()
            .map(|link| LinkResponse::from_link_with_clicks(link, &self.config))
            .collect())
    }

    /// Bounded generate-and-insert loop. Each length gets
    /// `ATTEMPTS_PER_LENGTH` tries before the code is widened by one
    /// character, up to `utils::MAX_CODE_LENGTH`. Uniqueness and the
    /// owner quota are both decided inside the insert statement, never
    /// by a separate check.
    async fn insert_with_fresh_code(&self, request: &CreateLinkRequest) -> Result<SmartLink> {
        let max = self.config.max_links_per_owner;
        let quota = match (&request.owner_id, max) {
            (Some(_), limit) if limit > 0 => Some(limit),
            _ => None,
        };

        let base_len = self.config.code_length;
        let widths = (utils::MAX_CODE_LENGTH - base_len + 1) as u32;
        let total_attempts = ATTEMPTS_PER_LENGTH * widths;

        for attempt in 0..total_attempts {
            let length = base_len + (attempt / ATTEMPTS_PER_LENGTH) as usize;
            let code = utils::generate_code_with_length(length);

            let candidate = CreateLink {
                id: Id::new().into_string(),
                code,
                destination_url: request.destination_url.clone(),
                owner_id: request.owner_id.clone(),
            };

            match self.links.try_insert(&candidate, quota).await? {
                InsertOutcome::Inserted(link) => return Ok(link),
                InsertOutcome::QuotaExceeded => return Err(AppError::PlanLimitReached(max)),
                InsertOutcome::CodeTaken => {
                    info!(attempt, length, "short-code collision, retrying");
                }
            }
        }

        Err(AppError::GenerationExhausted {
            attempts: total_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ConfigBuilder, database::Database};

    async fn service(max_links_per_owner: u32) -> LinkService {
        let db = Database::in_memory().await.unwrap();
        let config = Arc::new(
            ConfigBuilder::new()
                .base_url("https://sl.example")
                .max_links_per_owner(max_links_per_owner)
                .build(),
        );
        LinkService::new(
            LinkRepository::new(db.clone()),
            ClickRepository::new(db),
            config,
        )
    }

    fn request(url: &str, owner: Option<&str>) -> CreateLinkRequest {
        CreateLinkRequest {
            destination_url: url.to_string(),
            owner_id: owner.map(ToString::to_string),
        }
    }

    #[tokio::test]
    async fn create_then_resolve_round_trip() {
        let service = service(0).await;

        let created = service
            .create_link(request("https://zillow.com/home/123", None))
            .await
            .unwrap();
        assert!(created.code.len() >= 6 && created.code.len() <= 8);
        assert_eq!(created.clicks, 0);
        assert_eq!(
            created.short_url,
            format!("https://sl.example/{}", created.code)
        );

        let destination = service
            .resolve(&created.code, Visitor::default())
            .await
            .unwrap();
        assert_eq!(destination, "https://zillow.com/home/123");
    }

    #[tokio::test]
    async fn resolve_records_a_click() {
        let service = service(0).await;
        let created = service
            .create_link(request("https://example.com", None))
            .await
            .unwrap();

        let visitor = Visitor {
            referrer: Some("https://google.com".to_string()),
            ip: Some("203.0.113.7".to_string()),
            user_agent: Some("Mozilla/5.0 (iPhone) Mobile".to_string()),
        };
        service.resolve(&created.code, visitor).await.unwrap();

        let info = service.get_link(&created.code).await.unwrap();
        assert_eq!(info.clicks, 1);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let service = service(0).await;

        let err = service
            .resolve("zzzzzz", Visitor::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_invalid_destinations() {
        let service = service(0).await;

        for bad in ["not a url", "ftp://example.com", ""] {
            let err = service.create_link(request(bad, None)).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidUrl(_)), "accepted {bad:?}");
        }
    }

    #[tokio::test]
    async fn owner_quota_is_enforced() {
        let service = service(2).await;

        for _ in 0..2 {
            service
                .create_link(request("https://example.com", Some("agent-7")))
                .await
                .unwrap();
        }

        let err = service
            .create_link(request("https://example.com", Some("agent-7")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PlanLimitReached(2)));

        // A different owner is unaffected.
        service
            .create_link(request("https://example.com", Some("agent-8")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn quota_holds_under_concurrent_creates() {
        let service = Arc::new(service(3).await);

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .create_link(CreateLinkRequest {
                        destination_url: format!("https://example.com/{i}"),
                        owner_id: Some("agent-7".to_string()),
                    })
                    .await
            }));
        }

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(matches!(err, AppError::PlanLimitReached(3))),
            }
        }

        // The count guard lives inside the insert statement, so racing
        // creates can never overshoot the limit.
        assert_eq!(created, 3);
        assert_eq!(service.list_links(Some("agent-7")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn listing_scopes_by_owner() {
        let service = service(0).await;

        service
            .create_link(request("https://example.com/a", Some("alice")))
            .await
            .unwrap();
        service
            .create_link(request("https://example.com/b", Some("bob")))
            .await
            .unwrap();

        let alice = service.list_links(Some("alice")).await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].destination_url, "https://example.com/a");

        let all = service.list_links(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_creates_never_share_codes() {
        let service = Arc::new(service(0).await);

        let mut handles = Vec::new();
        for i in 0..32 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .create_link(CreateLinkRequest {
                        destination_url: format!("https://example.com/{i}"),
                        owner_id: None,
                    })
                    .await
                    .unwrap()
                    .code
            }));
        }

        let mut codes = std::collections::HashSet::new();
        for handle in handles {
            assert!(codes.insert(handle.await.unwrap()));
        }
        assert_eq!(codes.len(), 32);
    }
}
