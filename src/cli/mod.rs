//! CLI module
//!
//! Command-line interface for collecting catalogs.
//!
//! # Commands
//!
//! - `collect` - Collect one or more catalogs and write output files
//! - `check` - Test connection to the API with a profile request
//! - `identity` - Extract the numeric identity from a profile URL
//! - `config` - Print the effective configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
