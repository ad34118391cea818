//! Pagination controller
//!
//! Drives a [`PageSource`] from page 1 until a termination condition fires,
//! accumulating normalized records. A run is strictly sequential: the page
//! cursor only advances after a successful page, and a failed page is retried
//! at the same index after a backoff wait.

use super::source::PageSource;
use super::types::{Collection, CollectionState, PaginationConfig, TerminationReason};
use crate::catalog::{Identity, RecordNormalizer};
use crate::error::{Error, Result};
use chrono::Utc;
use tracing::{error, info, warn};

/// Collects every page of an identity's listing
#[derive(Debug)]
pub struct PaginationController<S> {
    source: S,
    config: PaginationConfig,
    normalizer: RecordNormalizer,
}

impl<S: PageSource> PaginationController<S> {
    /// Create a controller with default configuration
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: PaginationConfig::default(),
            normalizer: RecordNormalizer::default(),
        }
    }

    /// Set pagination configuration
    #[must_use]
    pub fn with_config(mut self, config: PaginationConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the record normalizer
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: RecordNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Get the page source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get the configuration
    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Collect with the configured page cap
    pub async fn collect(&self, identity: &Identity) -> Result<Collection> {
        self.collect_all(identity, self.config.max_pages).await
    }

    /// Collect every page of `identity`'s listing, up to `max_pages`
    ///
    /// Always returns what was accumulated, together with the reason the run
    /// ended. Only invalid arguments produce an error.
    pub async fn collect_all(&self, identity: &Identity, max_pages: u32) -> Result<Collection> {
        if max_pages == 0 {
            return Err(Error::invalid_value("max_pages", "must be positive"));
        }
        if self.config.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be positive"));
        }

        let started_at = Utc::now();
        let page_size = self.config.page_size;
        let max_failures = self.config.max_consecutive_failures.max(1);
        let mut state = CollectionState::new();

        info!("Collecting catalog of {identity} (up to {max_pages} pages)");

        let termination = loop {
            if state.page > max_pages {
                info!("Reached page cap of {max_pages}");
                break TerminationReason::MaxPagesReached;
            }

            info!(page = state.page, "Fetching page");
            state.begin_request();

            let items = match self.source.fetch_page(identity, state.page, page_size).await {
                Ok(items) => items,
                Err(failure) => {
                    let failures = state.record_failure();
                    warn!(
                        page = state.page,
                        consecutive_failures = failures,
                        "Page fetch failed: {failure}"
                    );

                    if failures >= max_failures {
                        error!("{failures} consecutive failures, stopping collection");
                        break TerminationReason::ConsecutiveFailures;
                    }

                    let wait = self.config.failure_backoff.delay(failures);
                    info!(
                        "Waiting {}s before retrying page {}",
                        wait.as_secs(),
                        state.page
                    );
                    tokio::time::sleep(wait).await;
                    continue;
                }
            };

            state.record_success();

            if items.is_empty() {
                info!(page = state.page, "No more items");
                break TerminationReason::EmptyPage;
            }

            let count = items.len();
            let page = state.page;
            state.accumulate(
                items.iter().map(|item| self.normalizer.normalize(item, page)),
                self.config.dedupe,
            );
            info!(page, "Collected {count} items from page");

            if count < page_size as usize && self.config.short_page.terminates() {
                info!(page, "Short page, treating as the last page");
                break TerminationReason::ShortPage;
            }

            state.advance();
        };

        let collection = Collection::from_state(identity.clone(), state, termination, started_at);
        info!(
            "Collected {} records for {identity} in {} pages ({termination})",
            collection.len(),
            collection.pages_fetched
        );
        Ok(collection)
    }
}
