// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Catalog Collector
//!
//! Collects the complete content catalog of one account from a paginated,
//! rate-limited public listing API, and writes it out as CSV, a URL list or
//! JSON.
//!
//! ## Features
//!
//! - **Polite fetching**: Randomized pre-request delays and user agent rotation
//! - **Bounded retry**: Separate backoff schedules for 429s and network faults
//! - **Resilient paging**: Failed pages are retried in place; a run always ends
//!   with whatever was collected and the reason it stopped
//! - **YAML configuration**: Every endpoint, delay and threshold is overridable
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog_collector::{Collector, CollectorConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let collector = Collector::from_config(&CollectorConfig::default())?;
//!
//!     // Numeric id or profile URL
//!     let collection = collector.collect("https://space.bilibili.com/946974").await?;
//!     println!("{} records ({})", collection.len(), collection.termination);
//!
//!     collector.save(&collection);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Collector                            │
//! │  resolve identity → collect pages → save files               │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌───────────────┬─────────────┴─────┬──────────────┬───────────┐
//! │     HTTP      │    Pagination     │   Catalog    │  Output   │
//! ├───────────────┼───────────────────┼──────────────┼───────────┤
//! │ Pacing        │ Page cursor       │ Identity     │ CSV       │
//! │ UA rotation   │ Failure counter   │ API envelope │ URL list  │
//! │ 429 backoff   │ Termination       │ Normalizer   │ JSON      │
//! │ Retry budget  │ Page backoff      │ Profile      │           │
//! └───────────────┴───────────────────┴──────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the collector
pub mod error;

/// Common types and type aliases
pub mod types;

/// Configuration loaded from YAML
pub mod config;

/// HTTP fetcher with pacing, retry and backoff
pub mod http;

/// Pagination controller
pub mod pagination;

/// Listing API client, identities and records
pub mod catalog;

/// CSV, URL list and JSON output
pub mod output;

/// End-to-end collection
pub mod collector;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use catalog::{CatalogClient, Identity, Record};
pub use collector::Collector;
pub use config::CollectorConfig;
pub use http::{FailureKind, FetchFailure, RateLimitedFetcher};
pub use pagination::{Collection, PaginationController, TerminationReason};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
