//! Application configuration, loaded from environment variables with
//! sensible development defaults. A `ConfigBuilder` is provided for tests
//! and embedding.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Runtime configuration for the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bind address of the HTTP server.
    pub host: String,

    /// Bind port of the HTTP server.
    pub port: u16,

    /// Public base URL used to build short URLs and QR image URLs.
    /// This is what ends up printed on flyers, so it must be the
    /// externally reachable address, not the bind address.
    pub base_url: String,

    /// sqlx database URL, e.g. `sqlite://data/smartlinks.db?mode=rwc`.
    pub database_url: String,

    /// Maximum number of links a single owner may create. `0` disables
    /// the quota. Exceeding it answers `402 Payment Required`.
    pub max_links_per_owner: u32,

    /// Length of freshly generated short codes. The generator widens
    /// beyond this on repeated collisions, up to `utils::MAX_CODE_LENGTH`.
    pub code_length: usize,

    /// Allowed requests per client per window on the `/api` routes.
    pub rate_limit_per_window: u32,

    /// Rate-limit window in seconds.
    pub rate_limit_window_secs: u64,

    /// Deployment environment.
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            database_url: "sqlite://data/smartlinks.db?mode=rwc".to_string(),
            max_links_per_owner: 0,
            code_length: crate::utils::DEFAULT_CODE_LENGTH,
            rate_limit_per_window: 120,
            rate_limit_window_secs: 60,
            environment: Environment::Development,
        }
    }
}

impl Config {
    /// Build the configuration from environment variables, falling back
    /// to development defaults for anything unset.
    ///
    /// # Errors
    /// Currently infallible; the `Result` keeps the call site uniform
    /// with `validate`.
    pub fn from_env() -> Result<Self> {
        let get_env =
            |key: &str, default: &str| env::var(key).unwrap_or_else(|_| default.to_string());

        // Parses at the field's own width; a value that does not fit
        // (e.g. PORT=70000) falls back to the default instead of
        // silently truncating.
        fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
            env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        Ok(Self {
            host: get_env("HOST", "127.0.0.1"),
            port: parse_env("PORT", 3000u16),
            base_url: get_env("BASE_URL", "http://localhost:3000"),
            database_url: get_env("DATABASE_URL", "sqlite://data/smartlinks.db?mode=rwc"),
            max_links_per_owner: parse_env("MAX_LINKS_PER_OWNER", 0u32),
            code_length: parse_env("CODE_LENGTH", crate::utils::DEFAULT_CODE_LENGTH),
            rate_limit_per_window: parse_env("RATE_LIMIT_PER_WINDOW", 120u32),
            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", 60u64),
            environment: get_env("ENVIRONMENT", "development").into(),
        })
    }

    /// Sanity checks that would otherwise surface as confusing runtime
    /// behavior.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(AppError::Config("PORT cannot be 0".to_string()));
        }

        if self.code_length < crate::utils::MIN_CODE_LENGTH
            || self.code_length > crate::utils::MAX_CODE_LENGTH
        {
            return Err(AppError::Config(format!(
                "CODE_LENGTH must be between {} and {}",
                crate::utils::MIN_CODE_LENGTH,
                crate::utils::MAX_CODE_LENGTH
            )));
        }

        // Short URLs printed on QR codes must resolve from the outside.
        if self.environment.is_production() && self.base_url.contains("localhost") {
            return Err(AppError::Config(
                "BASE_URL must not point at localhost in production".to_string(),
            ));
        }

        Ok(())
    }

    /// Full short URL for a code, e.g. `https://sl.example/aZ3kq1`.
    #[must_use]
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), code)
    }

    /// Public URL of the QR image for a code.
    #[must_use]
    pub fn qr_image_url(&self, code: &str) -> String {
        format!(
            "{}/api/links/{}/qr.svg",
            self.base_url.trim_end_matches('/'),
            code
        )
    }
}

// =====================================
// Builder
// =====================================

/// Incremental construction of a [`Config`], mainly for tests.
///
/// ```rust
/// use smartlinks::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .port(8080)
///     .base_url("https://sl.example")
///     .build();
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    #[must_use]
    pub fn max_links_per_owner(mut self, max: u32) -> Self {
        self.config.max_links_per_owner = max;
        self
    }

    #[must_use]
    pub fn code_length(mut self, len: usize) -> Self {
        self.config.code_length = len;
        self
    }

    #[must_use]
    pub fn rate_limit(mut self, per_window: u32, window_secs: u64) -> Self {
        self.config.rate_limit_per_window = per_window;
        self.config.rate_limit_window_secs = window_secs;
        self
    }

    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step.
    ///
    /// # Errors
    /// Returns the validation error, if any.
    pub fn build_validated(self) -> Result<Config> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
