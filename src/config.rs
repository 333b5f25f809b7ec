//! Loader configuration

use crate::error::{IngestError, Result};
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_DB_PATH: &str = "catalog.db";
pub const DEFAULT_ROADMAP_PREFIX: &str = "cs-";
pub const DEFAULT_PROFESSORS_FILE: &str = "rmp_professors.json";

/// Where to read from and which files play which role.
///
/// The store connection is opened by the caller and passed separately.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Directory scanned for `*.json` exports
    pub data_dir: PathBuf,

    /// File-name prefix marking degree roadmap files
    pub roadmap_prefix: String,

    /// Ratings file, relative to `data_dir` unless absolute
    pub professors_file: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            roadmap_prefix: DEFAULT_ROADMAP_PREFIX.to_string(),
            professors_file: PathBuf::from(DEFAULT_PROFESSORS_FILE),
        }
    }
}

impl LoaderConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        LoaderConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Full path of the professors file
    pub fn professors_path(&self) -> PathBuf {
        self.data_dir.join(&self.professors_file)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.data_dir.is_dir() {
            return Err(IngestError::Config(format!(
                "data directory not found: {}",
                self.data_dir.display()
            )));
        }
        if self.roadmap_prefix.is_empty() {
            return Err(IngestError::Config(
                "roadmap prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
