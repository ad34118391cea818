//! HTTP fetch module
//!
//! Provides the rate-limited fetcher used for every call to the remote API.
//!
//! # Features
//!
//! - **Pacing**: Random pre-request delay, shorter before the very first request
//! - **Identity Rotation**: A fresh user agent from a fixed pool on every attempt
//! - **Backoff**: Separate capped exponential schedules for 429 and transport faults
//! - **Failure Classification**: Every failure carries the kind of its last attempt
//! - **Request Budget**: Optional governor token bucket shared between fetchers

mod backoff;
mod fetcher;
mod outcome;
mod pacing;
mod rate_limit;

pub use backoff::{Backoff, BackoffDef};
pub use fetcher::{
    FetchRequest, FetcherConfig, FetcherConfigBuilder, RateLimitedFetcher, DEFAULT_MAX_RETRIES,
    DEFAULT_TIMEOUT,
};
pub use outcome::{FailureKind, FetchFailure, FetchOutcome};
pub use pacing::{DelayRange, Pacing, UserAgentPool, DEFAULT_USER_AGENTS, MAX_DELAY_SECONDS};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
