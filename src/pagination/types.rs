//! Pagination types
//!
//! Configuration, run state and the result of a collection run.

use crate::catalog::{Identity, Record};
use crate::http::Backoff;
use crate::types::ShortPagePolicy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Default nominal page size
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Default hard cap on pages per run
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Default number of failed pages in a row that ends a run
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Configuration for a collection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Nominal number of items per page
    pub page_size: u32,
    /// Page cap used by [`collect`](super::PaginationController::collect)
    pub max_pages: u32,
    /// Failed page fetches in a row that end the run
    pub max_consecutive_failures: u32,
    /// Wait between a failed page and its retry, indexed by failure count
    pub failure_backoff: Backoff,
    /// Whether a short page ends the run
    pub short_page: ShortPagePolicy,
    /// Drop records whose identifier was already collected
    pub dedupe: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            failure_backoff: Backoff::page_failure(),
            short_page: ShortPagePolicy::Terminate,
            dedupe: false,
        }
    }
}

impl PaginationConfig {
    /// Create a new pagination config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page size
    #[must_use]
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Set the default page cap
    #[must_use]
    pub fn with_max_pages(mut self, max: u32) -> Self {
        self.max_pages = max;
        self
    }

    /// Set the consecutive failure threshold
    #[must_use]
    pub fn with_max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = max;
        self
    }

    /// Set the backoff between failed pages
    #[must_use]
    pub fn with_failure_backoff(mut self, backoff: Backoff) -> Self {
        self.failure_backoff = backoff;
        self
    }

    /// Set the short page policy
    #[must_use]
    pub fn with_short_page_policy(mut self, policy: ShortPagePolicy) -> Self {
        self.short_page = policy;
        self
    }

    /// Enable or disable deduplication by record identifier
    #[must_use]
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }
}

/// Why a collection run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// A page came back with no items
    EmptyPage,
    /// A page came back with fewer items than the page size
    ShortPage,
    /// The page cap was reached with every page full
    MaxPagesReached,
    /// Too many failed page fetches in a row
    ConsecutiveFailures,
}

impl TerminationReason {
    /// Whether the run saw the end of the listing
    pub fn reached_end(&self) -> bool {
        matches!(self, Self::EmptyPage | Self::ShortPage)
    }

    /// Whether the run gave up because of failures
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ConsecutiveFailures)
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::EmptyPage => "empty page",
            Self::ShortPage => "short page",
            Self::MaxPagesReached => "page cap reached",
            Self::ConsecutiveFailures => "consecutive failures exhausted",
        };
        f.write_str(reason)
    }
}

/// Mutable state of one run
#[derive(Debug, Clone)]
pub struct CollectionState {
    /// Accumulated records in page order, then source order
    pub records: Vec<Record>,
    /// Page to fetch next (1-based)
    pub page: u32,
    /// Failed fetches since the last success
    pub consecutive_failures: u32,
    /// Page fetches issued, including failed ones
    pub requests: u64,
    /// Pages that returned successfully
    pub pages_fetched: u32,
    /// Failed page fetches over the whole run
    pub failures: u32,
    /// Records dropped as duplicates
    pub duplicates: usize,
    seen: HashSet<String>,
}

impl Default for CollectionState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            page: 1,
            consecutive_failures: 0,
            requests: 0,
            pages_fetched: 0,
            failures: 0,
            duplicates: 0,
            seen: HashSet::new(),
        }
    }
}

impl CollectionState {
    /// Create state positioned at page 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a page fetch
    pub fn begin_request(&mut self) {
        self.requests += 1;
    }

    /// Count a failed fetch; returns the consecutive failure count
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures += 1;
        self.failures += 1;
        self.consecutive_failures
    }

    /// Count a successful fetch
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.pages_fetched += 1;
    }

    /// Append a page's records, optionally skipping known identifiers
    pub fn accumulate(&mut self, records: impl IntoIterator<Item = Record>, dedupe: bool) {
        for record in records {
            if dedupe && !self.seen.insert(record.id.clone()) {
                self.duplicates += 1;
                continue;
            }
            self.records.push(record);
        }
    }

    /// Move to the next page
    pub fn advance(&mut self) {
        self.page += 1;
    }
}

/// Result of a collection run
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    /// Whose catalog was collected
    pub identity: Identity,
    /// Records in page order, then source order
    pub records: Vec<Record>,
    /// Why the run ended
    pub termination: TerminationReason,
    /// Pages that returned successfully
    pub pages_fetched: u32,
    /// Page fetches issued
    pub requests: u64,
    /// Failed page fetches
    pub failures: u32,
    /// Records dropped as duplicates
    pub duplicates: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Collection {
    /// Finish a run from its final state
    pub fn from_state(
        identity: Identity,
        state: CollectionState,
        termination: TerminationReason,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            identity,
            records: state.records,
            termination,
            pages_fetched: state.pages_fetched,
            requests: state.requests,
            failures: state.failures,
            duplicates: state.duplicates,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the run saw the end of the listing
    pub fn reached_end(&self) -> bool {
        self.termination.reached_end()
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
