//! Output file naming and saving
//!
//! File names follow `<prefix>_<identity>` with a per-format suffix:
//!
//! - `bilibili_videos_42.csv`
//! - `bilibili_videos_42_urls.txt`
//! - `bilibili_videos_42.json`

use super::writer::{write_csv, write_json, write_url_list};
use crate::catalog::Identity;
use crate::config::OutputSettings;
use crate::error::Result;
use crate::pagination::Collection;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Urls,
    Json,
}

impl FileFormat {
    /// Suffix appended to `<prefix>_<identity>`
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Csv => ".csv",
            Self::Urls => "_urls.txt",
            Self::Json => ".json",
        }
    }
}

/// Which files to write and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    directory: PathBuf,
    prefix: String,
    formats: Vec<FileFormat>,
}

impl Default for OutputPlan {
    fn default() -> Self {
        Self::from_settings(&OutputSettings::default())
    }
}

impl OutputPlan {
    /// Build a plan from output settings
    pub fn from_settings(settings: &OutputSettings) -> Self {
        let formats = [
            (settings.csv, FileFormat::Csv),
            (settings.urls, FileFormat::Urls),
            (settings.json, FileFormat::Json),
        ]
        .into_iter()
        .filter_map(|(enabled, format)| enabled.then_some(format))
        .collect();

        Self {
            directory: settings.directory.clone(),
            prefix: settings.file_prefix.clone(),
            formats,
        }
    }

    /// Output directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Enabled formats, in write order
    pub fn formats(&self) -> &[FileFormat] {
        &self.formats
    }

    /// Path of the file for one identity and format
    pub fn path_for(&self, identity: &Identity, format: FileFormat) -> PathBuf {
        self.directory
            .join(format!("{}_{identity}{}", self.prefix, format.suffix()))
    }

    /// Write one format
    pub fn write(&self, collection: &Collection, format: FileFormat) -> Result<PathBuf> {
        let path = self.path_for(&collection.identity, format);
        let count = match format {
            FileFormat::Csv => write_csv(&path, &collection.records)?,
            FileFormat::Urls => write_url_list(&path, &collection.records)?,
            FileFormat::Json => write_json(&path, collection)?,
        };
        info!("Saved {count} records to {}", path.display());
        Ok(path)
    }

    /// Write every enabled format, returning the paths that were written
    ///
    /// Failures are logged and skipped; an empty collection writes nothing.
    pub fn save(&self, collection: &Collection) -> Vec<PathBuf> {
        if collection.is_empty() {
            warn!("No records collected for {}, nothing to save", collection.identity);
            return Vec::new();
        }

        if let Err(e) = std::fs::create_dir_all(&self.directory) {
            error!(
                "Failed to create output directory {}: {e}",
                self.directory.display()
            );
            return Vec::new();
        }

        self.formats
            .iter()
            .filter_map(|format| match self.write(collection, *format) {
                Ok(path) => Some(path),
                Err(e) => {
                    error!("Failed to save {format:?} output: {e}");
                    None
                }
            })
            .collect()
    }
}
