//! Request pacing and client identity rotation
//!
//! Every attempt waits a random delay before it goes out. The very first
//! request a fetcher issues draws from a short range; every later request
//! draws from a longer one.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Browser user agents rotated across attempts
pub const DEFAULT_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:90.0) Gecko/20100101 Firefox/90.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
];

/// Longest single wait accepted from configuration (one day)
pub const MAX_DELAY_SECONDS: f64 = 86_400.0;

/// Convert seconds to a duration, clamped to `[0, MAX_DELAY_SECONDS]`
pub(crate) fn clamped_secs(secs: f64) -> Duration {
    Duration::from_secs_f64(secs.max(0.0).min(MAX_DELAY_SECONDS))
}

/// Inclusive range of seconds to wait
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Lower bound in seconds
    pub min_seconds: f64,
    /// Upper bound in seconds
    pub max_seconds: f64,
}

impl DelayRange {
    /// Create a new range
    pub const fn new(min_seconds: f64, max_seconds: f64) -> Self {
        Self {
            min_seconds,
            max_seconds,
        }
    }

    /// A range that never waits
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Whether the bounds are usable
    pub fn is_valid(&self) -> bool {
        self.min_seconds >= 0.0
            && self.min_seconds.is_finite()
            && self.max_seconds.is_finite()
            && self.min_seconds <= self.max_seconds
            && self.max_seconds <= MAX_DELAY_SECONDS
    }

    /// Draw a delay uniformly from the range
    pub fn sample(&self) -> Duration {
        let min = self.min_seconds.max(0.0).min(MAX_DELAY_SECONDS);
        let max = self.max_seconds.min(MAX_DELAY_SECONDS);
        if max <= min {
            return clamped_secs(min);
        }
        clamped_secs(rand::thread_rng().gen_range(min..=max))
    }

    /// Whether a duration falls inside the range
    pub fn contains(&self, delay: Duration) -> bool {
        let secs = delay.as_secs_f64();
        secs >= self.min_seconds && secs <= self.max_seconds
    }
}

/// Pre-request delay distributions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pacing {
    /// Delay before the first request a fetcher ever issues
    pub first: DelayRange,
    /// Delay before every later request
    pub subsequent: DelayRange,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            first: DelayRange::new(3.0, 8.0),
            subsequent: DelayRange::new(8.0, 20.0),
        }
    }
}

impl Pacing {
    /// No pacing at all
    pub const fn none() -> Self {
        Self {
            first: DelayRange::zero(),
            subsequent: DelayRange::zero(),
        }
    }

    /// Range used for a request, given whether any request was issued before
    pub fn range_for(&self, is_first: bool) -> &DelayRange {
        if is_first {
            &self.first
        } else {
            &self.subsequent
        }
    }

    /// Draw the delay for a request
    pub fn delay_for(&self, is_first: bool) -> Duration {
        self.range_for(is_first).sample()
    }
}

/// Fixed pool of user agent strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENTS.iter().map(ToString::to_string))
    }
}

impl UserAgentPool {
    /// Create a pool from any list of agents
    pub fn new(agents: impl IntoIterator<Item = String>) -> Self {
        Self {
            agents: agents.into_iter().filter(|a| !a.trim().is_empty()).collect(),
        }
    }

    /// Pick an agent uniformly at random
    pub fn pick(&self) -> Option<&str> {
        self.agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }

    /// Number of agents in the pool
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// All agents in the pool
    pub fn agents(&self) -> &[String] {
        &self.agents
    }
}
