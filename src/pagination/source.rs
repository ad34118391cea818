//! Page sources
//!
//! A [`PageSource`] performs one page fetch for the controller. The production
//! source is [`CatalogClient`](crate::catalog::CatalogClient); tests script
//! their own.

use crate::catalog::Identity;
use crate::http::FetchOutcome;
use async_trait::async_trait;
use serde_json::Value;

/// Fetches the raw items of one page
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch page `page` (1-based) of `identity`'s listing
    ///
    /// Returns the page's raw items in source order, or the failure of the
    /// fetch once the source has exhausted its own retries.
    async fn fetch_page(
        &self,
        identity: &Identity,
        page: u32,
        page_size: u32,
    ) -> FetchOutcome<Vec<Value>>;
}

