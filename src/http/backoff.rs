//! Backoff schedules
//!
//! A [`Backoff`] turns a retry exponent into a capped wait. The fetcher keeps
//! one schedule for 429 responses and one for transport faults; the
//! pagination controller keeps a third for whole-page failures.

use super::pacing::{clamped_secs, MAX_DELAY_SECONDS};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capped backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// How the delay grows with the exponent
    pub kind: BackoffType,
    /// Delay for exponent 0
    pub base: Duration,
    /// Upper bound on any single delay
    pub cap: Duration,
}

impl Backoff {
    /// Exponential schedule: `min(base * 2^n, cap)`
    pub const fn exponential(base: Duration, cap: Duration) -> Self {
        Self {
            kind: BackoffType::Exponential,
            base,
            cap,
        }
    }

    /// A schedule that never waits
    pub const fn none() -> Self {
        Self::exponential(Duration::ZERO, Duration::ZERO)
    }

    /// Schedule for HTTP 429: `min(60 * 2^n, 600)` seconds
    pub const fn rate_limited() -> Self {
        Self::exponential(Duration::from_secs(60), Duration::from_secs(600))
    }

    /// Schedule for transport faults: `min(30 * 2^n, 300)` seconds
    pub const fn network() -> Self {
        Self::exponential(Duration::from_secs(30), Duration::from_secs(300))
    }

    /// Schedule between failed pages: `min(60 * 2^n, 300)` seconds
    pub const fn page_failure() -> Self {
        Self::exponential(Duration::from_secs(60), Duration::from_secs(300))
    }

    /// Delay for the given exponent
    pub fn delay(&self, exponent: u32) -> Duration {
        let delay = match self.kind {
            BackoffType::Constant => self.base,
            BackoffType::Linear => self.base.saturating_mul(exponent.saturating_add(1)),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(exponent);
                self.base.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.cap)
    }
}

/// Serialized form of a [`Backoff`], in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffDef {
    /// Growth strategy
    #[serde(default, rename = "type")]
    pub kind: BackoffType,
    /// Base delay in seconds
    pub base_seconds: f64,
    /// Maximum delay in seconds
    pub max_seconds: f64,
}

impl BackoffDef {
    /// Create an exponential definition
    pub fn exponential(base_seconds: f64, max_seconds: f64) -> Self {
        Self {
            kind: BackoffType::Exponential,
            base_seconds,
            max_seconds,
        }
    }

    /// Whether both bounds lie within `[0, MAX_DELAY_SECONDS]`
    pub fn is_valid(&self) -> bool {
        [self.base_seconds, self.max_seconds]
            .iter()
            .all(|s| s.is_finite() && (0.0..=MAX_DELAY_SECONDS).contains(s))
    }
}

impl From<BackoffDef> for Backoff {
    fn from(def: BackoffDef) -> Self {
        Self {
            kind: def.kind,
            base: clamped_secs(def.base_seconds),
            cap: clamped_secs(def.max_seconds),
        }
    }
}

#[cfg(test)]
mod backoff_tests {
    use super::*;

    #[test]
    fn test_rate_limited_schedule() {
        let backoff = Backoff::rate_limited();
        let secs: Vec<u64> = (0..6).map(|n| backoff.delay(n).as_secs()).collect();
        assert_eq!(secs, vec![60, 120, 240, 480, 600, 600]);
    }

    #[test]
    fn test_network_schedule() {
        let backoff = Backoff::network();
        let secs: Vec<u64> = (0..6).map(|n| backoff.delay(n).as_secs()).collect();
        assert_eq!(secs, vec![30, 60, 120, 240, 300, 300]);
    }

    #[test]
    fn test_page_failure_schedule() {
        let backoff = Backoff::page_failure();
        assert_eq!(backoff.delay(1), Duration::from_secs(120));
        assert_eq!(backoff.delay(2), Duration::from_secs(240));
        assert_eq!(backoff.delay(3), Duration::from_secs(300));
    }

    #[test]
    fn test_backoff_def_validity() {
        assert!(BackoffDef::exponential(60.0, 600.0).is_valid());
        assert!(BackoffDef::exponential(0.0, 0.0).is_valid());
        assert!(!BackoffDef::exponential(-1.0, 10.0).is_valid());
        assert!(!BackoffDef::exponential(1.0, f64::INFINITY).is_valid());
        assert!(!BackoffDef::exponential(1.0e20, 1.0e20).is_valid());
    }

    #[test]
    fn test_oversized_def_converts_without_panic() {
        let backoff = Backoff::from(BackoffDef::exponential(1.0e20, 1.0e20));
        assert_eq!(backoff.base, Duration::from_secs(86_400));
        assert_eq!(backoff.cap, Duration::from_secs(86_400));
    }

    #[test]
    fn test_large_exponent_saturates_to_cap() {
        let backoff = Backoff::rate_limited();
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(600));
    }

    #[test]
    fn test_linear_and_constant() {
        let linear = Backoff {
            kind: BackoffType::Linear,
            base: Duration::from_secs(10),
            cap: Duration::from_secs(25),
        };
        assert_eq!(linear.delay(0), Duration::from_secs(10));
        assert_eq!(linear.delay(1), Duration::from_secs(20));
        assert_eq!(linear.delay(2), Duration::from_secs(25));

        let constant = Backoff {
            kind: BackoffType::Constant,
            base: Duration::from_secs(7),
            cap: Duration::from_secs(100),
        };
        assert_eq!(constant.delay(5), Duration::from_secs(7));
    }

    #[test]
    fn test_none_never_waits() {
        assert_eq!(Backoff::none().delay(10), Duration::ZERO);
    }

    #[test]
    fn test_from_def() {
        let backoff: Backoff = BackoffDef::exponential(0.5, 2.0).into();
        assert_eq!(backoff.delay(0), Duration::from_millis(500));
        assert_eq!(backoff.delay(3), Duration::from_secs(2));
    }
}
