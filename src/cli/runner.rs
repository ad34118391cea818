//! CLI runner - executes commands

use crate::catalog::Identity;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::collector::Collector;
use crate::config::CollectorConfig;
use crate::error::{Error, Result, ResultExt};
use crate::pagination::Collection;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::error;

/// Overrides applied to the configuration by `collect` flags
#[derive(Debug, Default)]
struct CollectOverrides {
    max_pages: Option<u32>,
    output: Option<PathBuf>,
    prefix: Option<String>,
    json: bool,
    no_csv: bool,
    no_urls: bool,
    dedupe: bool,
}

impl CollectOverrides {
    fn apply(self, config: &mut CollectorConfig) {
        if let Some(max_pages) = self.max_pages {
            config.pagination.max_pages = max_pages;
        }
        if let Some(directory) = self.output {
            config.output.directory = directory;
        }
        if let Some(prefix) = self.prefix {
            config.output.file_prefix = prefix;
        }
        config.output.json |= self.json;
        config.output.csv &= !self.no_csv;
        config.output.urls &= !self.no_urls;
        config.pagination.dedupe |= self.dedupe;
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Collect {
                targets,
                max_pages,
                output,
                prefix,
                json,
                no_csv,
                no_urls,
                dedupe,
            } => {
                let overrides = CollectOverrides {
                    max_pages: *max_pages,
                    output: output.clone(),
                    prefix: prefix.clone(),
                    json: *json,
                    no_csv: *no_csv,
                    no_urls: *no_urls,
                    dedupe: *dedupe,
                };
                self.collect(targets, overrides).await
            }
            Commands::Check { target } => self.check(target).await,
            Commands::Identity { url } => self.identity(url),
            Commands::Config => self.show_config(),
        }
    }

    /// Load configuration from `--config`, or defaults
    fn load_config(&self) -> Result<CollectorConfig> {
        match &self.cli.config {
            Some(path) => CollectorConfig::from_file(path),
            None => Ok(CollectorConfig::default()),
        }
    }

    /// Collect every target in turn over one shared fetcher
    async fn collect(&self, targets: &[String], overrides: CollectOverrides) -> Result<()> {
        let mut config = self.load_config()?;
        overrides.apply(&mut config);

        // Resolve every target before the first request goes out
        for target in targets {
            Identity::resolve(target)?;
        }

        let collector = Collector::from_config(&config)?;
        let mut failed = 0usize;

        for target in targets {
            match collector.collect(target).await {
                Ok(collection) => {
                    let files = collector.save(&collection);
                    self.output_message(&summary(&collection, &files));
                }
                Err(e) => {
                    error!("Collection for {target} failed: {e}");
                    self.output_message(&json!({
                        "type": "ERROR",
                        "target": target,
                        "message": e.to_string()
                    }));
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(Error::Other(format!(
                "{failed} of {} targets failed",
                targets.len()
            )));
        }
        Ok(())
    }

    /// Check connection with one profile request
    async fn check(&self, target: &str) -> Result<()> {
        let identity = Identity::resolve(target)?;
        let collector = Collector::from_config(&self.load_config()?)?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!("Checking connection to {}", collector.client().api().base_url)
            }
        }));

        match collector.client().profile(&identity).await {
            Ok(profile) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": "Connection successful",
                        "profile": profile
                    }
                }));
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}"),
                        "failure": e.kind
                    }
                }));
            }
        }

        Ok(())
    }

    /// Print the identity a profile URL resolves to
    fn identity(&self, url: &str) -> Result<()> {
        let identity = Identity::resolve(url)?;
        self.output_message(&json!({
            "type": "IDENTITY",
            "input": url,
            "identity": identity
        }));
        Ok(())
    }

    /// Print the effective configuration
    fn show_config(&self) -> Result<()> {
        let config = self.load_config()?;
        let yaml = config.to_yaml().context("Failed to render configuration")?;
        print!("{yaml}");
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Message describing a finished run
fn summary(collection: &Collection, files: &[PathBuf]) -> Value {
    json!({
        "type": "COLLECTION",
        "collection": {
            "identity": collection.identity,
            "records": collection.len(),
            "termination": collection.termination,
            "reached_end": collection.reached_end(),
            "pages_fetched": collection.pages_fetched,
            "requests": collection.requests,
            "failures": collection.failures,
            "duplicates": collection.duplicates,
            "duration_secs": collection.duration().num_seconds(),
            "files": files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>()
        }
    })
}
