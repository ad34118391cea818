//! End-to-end collection
//!
//! A [`Collector`] wires one fetcher, the catalog client, the pagination
//! controller and the output plan together from a [`CollectorConfig`]. The
//! fetcher is shared by every run of the same collector, so pacing carries over
//! from one target to the next.

use crate::catalog::{CatalogClient, Identity, Profile, RecordNormalizer};
use crate::config::CollectorConfig;
use crate::error::{Result, ResultExt};
use crate::http::RateLimitedFetcher;
use crate::output::OutputPlan;
use crate::pagination::{Collection, PaginationController};
use std::path::PathBuf;
use tracing::{info, warn};

/// Collects catalogs and persists them
#[derive(Debug)]
pub struct Collector {
    controller: PaginationController<CatalogClient>,
    output: OutputPlan,
    lookup_profile: bool,
}

impl Collector {
    /// Build a collector from a validated configuration
    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        config.validate()?;

        let fetcher = RateLimitedFetcher::with_config(config.fetcher_config())
            .context("Failed to build HTTP client")?;
        let client = CatalogClient::new(fetcher, config.api.clone())?;
        let controller = PaginationController::new(client)
            .with_config(config.pagination_config())
            .with_normalizer(RecordNormalizer::new(config.api.video_url_base.clone()));

        Ok(Self {
            controller,
            output: OutputPlan::from_settings(&config.output),
            lookup_profile: true,
        })
    }

    /// Skip the profile request made before each run
    #[must_use]
    pub fn without_profile_lookup(mut self) -> Self {
        self.lookup_profile = false;
        self
    }

    /// Get the catalog client
    pub fn client(&self) -> &CatalogClient {
        self.controller.source()
    }

    /// Get the output plan
    pub fn output(&self) -> &OutputPlan {
        &self.output
    }

    /// Look up the public profile of a target
    pub async fn profile(&self, target: &str) -> Result<Profile> {
        let identity = Identity::resolve(target)?;
        Ok(self.client().profile(&identity).await?)
    }

    /// Collect a target with the configured page cap
    pub async fn collect(&self, target: &str) -> Result<Collection> {
        self.collect_all(target, self.controller.config().max_pages)
            .await
    }

    /// Collect a target, a numeric id or a profile URL, up to `max_pages`
    ///
    /// The target is resolved before any request is made.
    pub async fn collect_all(&self, target: &str, max_pages: u32) -> Result<Collection> {
        let identity = Identity::resolve(target)?;

        if self.lookup_profile {
            match self.client().profile(&identity).await {
                Ok(profile) => info!(
                    "Collecting for {} ({identity})",
                    profile.name.as_deref().unwrap_or("unknown")
                ),
                Err(e) => warn!("Profile lookup for {identity} failed: {e}"),
            }
        }

        self.controller.collect_all(&identity, max_pages).await
    }

    /// Write the enabled output files, returning their paths
    pub fn save(&self, collection: &Collection) -> Vec<PathBuf> {
        self.output.save(collection)
    }
}
