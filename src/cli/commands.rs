//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated catalog collector CLI
#[derive(Parser, Debug)]
#[command(name = "catalog-collector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect catalogs, one target after another
    Collect {
        /// Numeric ids or profile URLs
        #[arg(required = true)]
        targets: Vec<String>,

        /// Maximum pages per target
        #[arg(long)]
        max_pages: Option<u32>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file name prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Also write a JSON document of each collection
        #[arg(long)]
        json: bool,

        /// Skip the CSV file
        #[arg(long)]
        no_csv: bool,

        /// Skip the URL list
        #[arg(long)]
        no_urls: bool,

        /// Drop records whose identifier was already collected
        #[arg(long)]
        dedupe: bool,
    },

    /// Test connection to the API
    Check {
        /// Numeric id or profile URL
        target: String,
    },

    /// Extract the identity from a profile URL
    Identity {
        /// Profile URL or numeric id
        url: String,
    },

    /// Show the effective configuration as YAML
    Config,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collect() {
        let cli = Cli::parse_from([
            "catalog-collector",
            "collect",
            "946974",
            "https://space.bilibili.com/42",
            "--max-pages",
            "5",
            "--json",
            "--no-urls",
        ]);

        match cli.command {
            Commands::Collect {
                targets,
                max_pages,
                json,
                no_urls,
                no_csv,
                ..
            } => {
                assert_eq!(targets, vec!["946974", "https://space.bilibili.com/42"]);
                assert_eq!(max_pages, Some(5));
                assert!(json);
                assert!(no_urls);
                assert!(!no_csv);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_collect_requires_target() {
        assert!(Cli::try_parse_from(["catalog-collector", "collect"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "catalog-collector",
            "check",
            "42",
            "--format",
            "pretty",
            "-C",
            "collector.yaml",
            "-v",
        ]);

        assert_eq!(cli.format, OutputFormat::Pretty);
        assert_eq!(cli.config, Some(PathBuf::from("collector.yaml")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Check { target } if target == "42"));
    }
}
