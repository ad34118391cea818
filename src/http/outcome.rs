//! Fetch outcomes
//!
//! A fetch either yields a decoded payload or a [`FetchFailure`] tagged with
//! the kind of the last failed attempt. Callers decide what to do with the
//! kind; the pagination controller only cares that no success was obtained.

use serde::Serialize;
use thiserror::Error;

/// Classification of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FailureKind {
    /// HTTP 429, retried on the rate-limit backoff schedule
    RateLimited,
    /// Timeout, connection reset, DNS failure; retried on the network schedule
    TransientNetwork,
    /// Any other non-200 status; retried immediately
    PermanentHttp(u16),
    /// 200 response whose body is not the expected JSON; not retried
    Decode,
    /// 200 response whose API status code is non-zero; not retried
    ApiRejected(i64),
}

impl FailureKind {
    /// Whether the fetcher retries this kind within a single fetch
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::TransientNetwork | Self::PermanentHttp(_)
        )
    }

    /// Whether a backoff wait is applied before the next attempt
    pub fn has_backoff(&self) -> bool {
        matches!(self, Self::RateLimited | Self::TransientNetwork)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate limited (429)"),
            Self::TransientNetwork => write!(f, "transient network error"),
            Self::PermanentHttp(status) => write!(f, "HTTP {status}"),
            Self::Decode => write!(f, "undecodable response body"),
            Self::ApiRejected(code) => write!(f, "API rejected request with code {code}"),
        }
    }
}

/// A fetch that produced no success
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch failed after {attempts} attempt(s): {kind}")]
pub struct FetchFailure {
    /// Kind of the last failed attempt
    pub kind: FailureKind,
    /// Number of attempts made
    pub attempts: u32,
}

impl FetchFailure {
    /// Create a new failure
    pub fn new(kind: FailureKind, attempts: u32) -> Self {
        Self { kind, attempts }
    }
}

/// Result of one logical fetch
pub type FetchOutcome<T = serde_json::Value> = std::result::Result<T, FetchFailure>;
