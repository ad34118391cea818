//! Output module
//!
//! Persists a finished collection.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Writing records as CSV (UTF-8 with BOM, fixed header)
//! - Writing a plain list of canonical URLs
//! - Writing the whole collection as JSON
//! - Naming output files per identity

mod plan;
mod writer;

pub use plan::{FileFormat, OutputPlan};
pub use writer::{escape_csv_field, write_csv, write_json, write_url_list, UTF8_BOM};
