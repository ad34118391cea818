//! Rate-limited fetcher
//!
//! Issues one logical GET against the remote API and shields the caller from
//! transient failures:
//! - Paces every attempt with a random delay (short before the first request
//!   ever issued, longer afterwards)
//! - Rotates the user agent on every attempt
//! - Backs off exponentially on 429 and on transport faults
//! - Retries other non-200 statuses without a dedicated backoff

use super::backoff::Backoff;
use super::outcome::{FailureKind, FetchFailure, FetchOutcome};
use super::pacing::{Pacing, UserAgentPool};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::Result;
use crate::types::{JsonValue, StringMap};
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default number of attempts per fetch
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest response body excerpt written to the log
const LOG_BODY_LIMIT: usize = 200;

/// Configuration for the fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Attempts per fetch unless the request overrides it
    pub max_retries: u32,
    /// Pre-request delay distributions
    pub pacing: Pacing,
    /// Backoff applied after a 429
    pub rate_limited_backoff: Backoff,
    /// Backoff applied after a transport fault
    pub network_backoff: Backoff,
    /// Rotated user agents
    pub user_agents: UserAgentPool,
    /// Headers sent with every request
    pub default_headers: StringMap,
    /// Optional request budget
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            pacing: Pacing::default(),
            rate_limited_backoff: Backoff::rate_limited(),
            network_backoff: Backoff::network(),
            user_agents: UserAgentPool::default(),
            default_headers: StringMap::new(),
            rate_limit: None,
        }
    }
}

impl FetcherConfig {
    /// Create a new config builder
    pub fn builder() -> FetcherConfigBuilder {
        FetcherConfigBuilder::default()
    }
}

/// Builder for fetcher config
#[derive(Default)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set pacing
    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.config.pacing = pacing;
        self
    }

    /// Set both backoff schedules
    pub fn backoff(mut self, rate_limited: Backoff, network: Backoff) -> Self {
        self.config.rate_limited_backoff = rate_limited;
        self.config.network_backoff = network;
        self
    }

    /// Set the user agent pool
    pub fn user_agents(mut self, agents: UserAgentPool) -> Self {
        self.config.user_agents = agents;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the request budget
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable all waiting (pacing and backoff)
    pub fn no_delays(mut self) -> Self {
        self.config.pacing = Pacing::none();
        self.config.rate_limited_backoff = Backoff::none();
        self.config.network_backoff = Backoff::none();
        self
    }

    /// Build the config
    pub fn build(self) -> FetcherConfig {
        self.config
    }
}

/// A single logical request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Absolute endpoint URL
    pub endpoint: String,
    /// Query parameters
    pub params: StringMap,
    /// Override max retries for this request
    pub max_retries: Option<u32>,
}

impl FetchRequest {
    /// Create a request for an endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: StringMap::new(),
            max_retries: None,
        }
    }

    /// Add a query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Add several query parameters
    #[must_use]
    pub fn params<'a>(
        mut self,
        params: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Self {
        for (key, value) in params {
            self.params.insert(key.clone(), value.clone());
        }
        self
    }

    /// Set max retries
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// Result of a single attempt
enum Attempt {
    Success(JsonValue),
    Retry(FailureKind),
    Abort(FailureKind),
}

/// HTTP fetcher with pacing, identity rotation and bounded retry
pub struct RateLimitedFetcher {
    client: Client,
    config: FetcherConfig,
    rate_limiter: Option<RateLimiter>,
    requests_issued: AtomicU64,
}

impl RateLimitedFetcher {
    /// Create a fetcher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let client = Client::builder().gzip(true).build()?;
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
            requests_issued: AtomicU64::new(0),
        })
    }

    /// Share a request budget with other fetchers
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Number of requests sent over this fetcher's lifetime
    pub fn requests_issued(&self) -> u64 {
        self.requests_issued.load(Ordering::SeqCst)
    }

    /// Check if a request budget is attached
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Fetch and decode one JSON payload, retrying transient failures
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        let max_retries = request
            .max_retries
            .unwrap_or(self.config.max_retries)
            .max(1);
        let mut last_kind = FailureKind::TransientNetwork;

        for attempt in 0..max_retries {
            let is_last = attempt + 1 == max_retries;

            match self.attempt(request).await {
                Attempt::Success(payload) => {
                    debug!(attempt = attempt + 1, "Request succeeded: {}", request.endpoint);
                    return Ok(payload);
                }
                Attempt::Abort(kind) => {
                    return Err(FetchFailure::new(kind, attempt + 1));
                }
                Attempt::Retry(kind) => {
                    last_kind = kind;
                    if is_last {
                        continue;
                    }

                    let backoff = match kind {
                        FailureKind::RateLimited => Some(&self.config.rate_limited_backoff),
                        FailureKind::TransientNetwork => Some(&self.config.network_backoff),
                        _ => None,
                    };

                    if let Some(backoff) = backoff {
                        let wait = backoff.delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max_retries,
                            wait_secs = wait.as_secs_f64(),
                            "{kind}, backing off before retry"
                        );
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        warn!(
            "Giving up on {} after {max_retries} attempt(s): {last_kind}",
            request.endpoint
        );
        Err(FetchFailure::new(last_kind, max_retries))
    }

    /// Make one paced attempt and classify it
    async fn attempt(&self, request: &FetchRequest) -> Attempt {
        self.pace().await;

        let mut req = self
            .client
            .get(&request.endpoint)
            .timeout(self.config.timeout);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some(agent) = self.config.user_agents.pick() {
            req = req.header(USER_AGENT, agent);
        }

        if !request.params.is_empty() {
            req = req.query(&request.params);
        }

        self.requests_issued.fetch_add(1, Ordering::SeqCst);

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Request error for {}: {e}", request.endpoint);
                return Attempt::Retry(FailureKind::TransientNetwork);
            }
        };

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Retry(FailureKind::RateLimited);
        }

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                "HTTP error from {}: {}",
                request.endpoint,
                excerpt(&body)
            );
            return Attempt::Retry(FailureKind::PermanentHttp(status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to read response body from {}: {e}", request.endpoint);
                return Attempt::Retry(FailureKind::TransientNetwork);
            }
        };

        match serde_json::from_str(&body) {
            Ok(payload) => Attempt::Success(payload),
            Err(e) => {
                error!(
                    "Response from {} is not JSON ({e}): {}",
                    request.endpoint,
                    excerpt(&body)
                );
                Attempt::Abort(FailureKind::Decode)
            }
        }
    }

    /// Wait before an attempt
    async fn pace(&self) {
        let is_first = self.requests_issued() == 0;
        let delay = self.config.pacing.delay_for(is_first);

        if !delay.is_zero() {
            debug!("Pacing delay {:.2}s", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }

        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
    }
}

impl std::fmt::Debug for RateLimitedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedFetcher")
            .field("config", &self.config)
            .field("requests_issued", &self.requests_issued())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Shorten a body for logging
fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(LOG_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
