//! Catalog module
//!
//! The remote listing API and the data it yields.
//!
//! # Overview
//!
//! - [`Identity`] - numeric account id, parsed directly or from a profile URL
//! - [`CatalogClient`] - the [`PageSource`](crate::pagination::PageSource)
//!   backed by the listing endpoint, plus the profile endpoint
//! - [`Record`] / [`RecordNormalizer`] - the fixed record schema

mod client;
mod identity;
mod record;

pub use client::{CatalogClient, Profile};
pub use identity::Identity;
pub use record::{Record, RecordNormalizer, RECORD_COLUMNS};
