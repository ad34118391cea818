//! Configuration for collection runs
//!
//! This module contains the configuration structures loaded from YAML. Every
//! field has a default, so an empty document describes a run against the
//! public video listing API with the stock pacing and backoff schedule.

use crate::error::{Error, Result};
use crate::http::{
    BackoffDef, DelayRange, FetcherConfig, Pacing, RateLimiterConfig, UserAgentPool,
    DEFAULT_USER_AGENTS,
};
use crate::pagination::PaginationConfig;
use crate::types::{ShortPagePolicy, StringMap};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete collector configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Remote API description
    pub api: ApiConfig,

    /// Fetch pacing, retry and backoff
    pub fetch: FetchSettings,

    /// Paging and termination
    pub pagination: PaginationSettings,

    /// Output files
    pub output: OutputSettings,
}

impl CollectorConfig {
    /// Load config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse config from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)?;

        if self.fetch.max_retries == 0 {
            return Err(Error::invalid_value("fetch.max_retries", "must be at least 1"));
        }
        if self.fetch.timeout_seconds == 0 {
            return Err(Error::invalid_value(
                "fetch.timeout_seconds",
                "must be at least 1",
            ));
        }
        for (field, range) in [
            ("fetch.first_delay", &self.fetch.first_delay),
            ("fetch.pacing_delay", &self.fetch.pacing_delay),
        ] {
            if !range.is_valid() {
                return Err(Error::invalid_value(
                    field,
                    "must satisfy 0 <= min_seconds <= max_seconds <= 86400",
                ));
            }
        }
        for (field, backoff) in [
            ("fetch.rate_limited_backoff", &self.fetch.rate_limited_backoff),
            ("fetch.network_backoff", &self.fetch.network_backoff),
            ("pagination.failure_backoff", &self.pagination.failure_backoff),
        ] {
            if !backoff.is_valid() {
                return Err(Error::invalid_value(
                    field,
                    "base_seconds and max_seconds must lie within 0..=86400",
                ));
            }
        }
        if self.fetch.user_agents.iter().all(|a| a.trim().is_empty()) {
            return Err(Error::invalid_value(
                "fetch.user_agents",
                "at least one user agent is required",
            ));
        }
        if self.pagination.page_size == 0 {
            return Err(Error::invalid_value("pagination.page_size", "must be positive"));
        }
        if self.pagination.max_pages == 0 {
            return Err(Error::invalid_value("pagination.max_pages", "must be positive"));
        }
        if self.pagination.max_consecutive_failures == 0 {
            return Err(Error::invalid_value(
                "pagination.max_consecutive_failures",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Build the fetcher configuration
    pub fn fetcher_config(&self) -> FetcherConfig {
        let fetch = &self.fetch;
        let mut builder = FetcherConfig::builder()
            .timeout(Duration::from_secs(fetch.timeout_seconds))
            .max_retries(fetch.max_retries)
            .pacing(Pacing {
                first: fetch.first_delay,
                subsequent: fetch.pacing_delay,
            })
            .backoff(
                fetch.rate_limited_backoff.into(),
                fetch.network_backoff.into(),
            )
            .user_agents(UserAgentPool::new(fetch.user_agents.clone()));

        for (key, value) in &self.api.headers {
            builder = builder.header(key, value);
        }

        if let Some(rpm) = fetch.requests_per_minute {
            builder = builder.rate_limit(RateLimiterConfig::per_minute(rpm));
        }

        builder.build()
    }

    /// Build the pagination configuration
    pub fn pagination_config(&self) -> PaginationConfig {
        let pagination = &self.pagination;
        PaginationConfig::new()
            .with_page_size(pagination.page_size)
            .with_max_pages(pagination.max_pages)
            .with_max_consecutive_failures(pagination.max_consecutive_failures)
            .with_failure_backoff(pagination.failure_backoff.into())
            .with_short_page_policy(pagination.short_page)
            .with_dedupe(pagination.dedupe)
    }
}

// ============================================================================
// API Config
// ============================================================================

/// Remote listing API description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL for API requests
    pub base_url: String,

    /// Path of the paginated listing endpoint
    pub listing_path: String,

    /// Path of the account profile endpoint
    pub profile_path: String,

    /// Query parameter carrying the identity
    pub identity_param: String,

    /// Query parameter carrying the 1-based page index
    pub page_param: String,

    /// Query parameter carrying the page size
    pub page_size_param: String,

    /// Extra query parameters sent with every listing request
    pub extra_params: StringMap,

    /// Dotted path from the response `data` object to the item list
    pub items_path: String,

    /// Prefix joined with an item identifier to form its canonical URL
    pub video_url_base: String,

    /// Headers sent with every request
    pub headers: StringMap,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let mut extra_params = StringMap::new();
        extra_params.insert("jsonp".to_string(), "jsonp".to_string());

        let headers = [
            ("Referer", "https://www.bilibili.com/"),
            ("Accept", "application/json, text/plain, */*"),
            ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8"),
            ("Cache-Control", "no-cache"),
            ("Pragma", "no-cache"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            base_url: "https://api.bilibili.com".to_string(),
            listing_path: "/x/space/arc/search".to_string(),
            profile_path: "/x/space/acc/info".to_string(),
            identity_param: "mid".to_string(),
            page_param: "pn".to_string(),
            page_size_param: "ps".to_string(),
            extra_params,
            items_path: "list.vlist".to_string(),
            video_url_base: "https://www.bilibili.com/video/".to_string(),
            headers,
        }
    }
}

// ============================================================================
// Fetch Settings
// ============================================================================

/// Fetch pacing, retry and backoff settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Attempts per page fetch
    pub max_retries: u32,

    /// Delay before the first request of the process
    pub first_delay: DelayRange,

    /// Delay before every later request
    pub pacing_delay: DelayRange,

    /// Backoff after HTTP 429
    pub rate_limited_backoff: BackoffDef,

    /// Backoff after transport faults
    pub network_backoff: BackoffDef,

    /// User agents rotated across attempts
    pub user_agents: Vec<String>,

    /// Optional hard budget on requests per minute
    pub requests_per_minute: Option<u32>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        let pacing = Pacing::default();
        Self {
            timeout_seconds: 30,
            max_retries: 5,
            first_delay: pacing.first,
            pacing_delay: pacing.subsequent,
            rate_limited_backoff: BackoffDef::exponential(60.0, 600.0),
            network_backoff: BackoffDef::exponential(30.0, 300.0),
            user_agents: DEFAULT_USER_AGENTS.iter().map(ToString::to_string).collect(),
            requests_per_minute: None,
        }
    }
}

// ============================================================================
// Pagination Settings
// ============================================================================

/// Paging and termination settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    /// Nominal number of items per page
    pub page_size: u32,

    /// Hard cap on pages fetched per run
    pub max_pages: u32,

    /// Failed page fetches in a row that end the run
    pub max_consecutive_failures: u32,

    /// Backoff between failed page fetches
    pub failure_backoff: BackoffDef,

    /// Whether a short page ends the run
    pub short_page: ShortPagePolicy,

    /// Drop records whose identifier was already collected in this run
    pub dedupe: bool,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            page_size: 30,
            max_pages: 100,
            max_consecutive_failures: 3,
            failure_backoff: BackoffDef::exponential(60.0, 300.0),
            short_page: ShortPagePolicy::Terminate,
            dedupe: false,
        }
    }
}

// ============================================================================
// Output Settings
// ============================================================================

/// Output file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory receiving output files
    pub directory: PathBuf,

    /// File name prefix, followed by `_<identity>`
    pub file_prefix: String,

    /// Write a CSV file
    pub csv: bool,

    /// Write a plain URL list
    pub urls: bool,

    /// Write a JSON document of the whole collection
    pub json: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_prefix: "bilibili_videos".to_string(),
            csv: true,
            urls: true,
            json: false,
        }
    }
}
