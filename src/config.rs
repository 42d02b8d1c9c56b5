use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

use crate::payments::types::Environment;

/// Square API version this integration is written against
pub const SQUARE_API_VERSION: &str = "2024-01-18";

pub const DEFAULT_PLATFORM_NAME: &str = "Event Espresso";

/// Merchant and transport settings for the Square gateway
#[derive(Debug, Clone, Deserialize)]
pub struct SquareConfig {
    /// Bearer token used for every Square API call
    pub access_token: String,
    /// Square location that receives the payments
    pub location_id: String,
    /// Site identity embedded in payment notes
    #[serde(default)]
    pub site_name: String,
    #[serde(default = "default_platform_name")]
    pub platform_name: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Overrides the environment's base URL (proxies, test servers)
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_platform_name() -> String {
    DEFAULT_PLATFORM_NAME.to_string()
}

fn default_api_version() -> String {
    SQUARE_API_VERSION.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

impl SquareConfig {
    /// Minimal configuration; everything else takes its default
    pub fn new<T: Into<String>, L: Into<String>>(access_token: T, location_id: L) -> Self {
        Self {
            access_token: access_token.into(),
            location_id: location_id.into(),
            site_name: String::new(),
            platform_name: default_platform_name(),
            api_version: default_api_version(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }

    pub fn with_site_name<S: Into<String>>(mut self, site_name: S) -> Self {
        self.site_name = site_name.into();
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }

    pub fn from_env() -> Result<Self> {
        let config = SquareConfig {
            access_token: env::var("SQUARE_ACCESS_TOKEN").context("SQUARE_ACCESS_TOKEN not set")?,
            location_id: env::var("SQUARE_LOCATION_ID").context("SQUARE_LOCATION_ID not set")?,
            site_name: env::var("SQUARE_SITE_NAME").unwrap_or_default(),
            platform_name: env::var("SQUARE_PLATFORM_NAME")
                .unwrap_or_else(|_| default_platform_name()),
            api_version: env::var("SQUARE_API_VERSION").unwrap_or_else(|_| default_api_version()),
            base_url: env::var("SQUARE_BASE_URL").ok().filter(|s| !s.trim().is_empty()),
            timeout_secs: env::var("SQUARE_TIMEOUT_SECS")
                .unwrap_or_else(|_| default_timeout_secs().to_string())
                .parse()
                .context("SQUARE_TIMEOUT_SECS must be a valid number")?,
            max_retries: env::var("SQUARE_MAX_RETRIES")
                .unwrap_or_else(|_| default_max_retries().to_string())
                .parse()
                .context("SQUARE_MAX_RETRIES must be a valid number")?,
            retry_backoff_ms: env::var("SQUARE_RETRY_BACKOFF_MS")
                .unwrap_or_else(|_| default_retry_backoff_ms().to_string())
                .parse()
                .context("SQUARE_RETRY_BACKOFF_MS must be a valid number")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from a config file, with `SQUARE_*` environment variables taking precedence
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()).required(false))
            .add_source(::config::Environment::with_prefix("SQUARE"))
            .build()
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;

        let config: SquareConfig = settings
            .try_deserialize()
            .context("invalid Square gateway configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(anyhow!("SQUARE_ACCESS_TOKEN cannot be empty"));
        }

        if self.location_id.trim().is_empty() {
            return Err(anyhow!("SQUARE_LOCATION_ID cannot be empty"));
        }

        if self.api_version.trim().is_empty() {
            return Err(anyhow!("SQUARE_API_VERSION cannot be empty"));
        }

        if let Some(base_url) = &self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(anyhow!(
                    "SQUARE_BASE_URL must be an http(s) URL, got {}",
                    base_url
                ));
            }
        }

        if self.timeout_secs == 0 {
            return Err(anyhow!("SQUARE_TIMEOUT_SECS must be greater than 0"));
        }

        Ok(())
    }

    /// API root for the given environment, honouring `base_url`
    pub fn api_base_url(&self, environment: Environment) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| environment.base_url())
            .trim_end_matches('/')
            .to_string()
    }
}
