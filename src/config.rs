//! Loader configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `IGRA_`-prefixed environment variables (`IGRA_INGEST__BATCH_SIZE=500`),
//! then whatever the command line overrides. The resulting [`LoaderConfig`]
//! is cloned into each worker task.

use crate::error::Result;
use crate::utils::constants::{
    ARCHIVE_SUFFIX, DEFAULT_BATCH_SIZE, DEFAULT_BUSY_TIMEOUT_SECS, DEFAULT_DATABASE_PATH,
    DEFAULT_MIN_WORKERS,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoaderConfig {
    #[validate(nested)]
    pub database: DatabaseConfig,

    #[validate(nested)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file shared by every worker connection.
    #[validate(length(min = 1))]
    pub path: String,

    #[validate(range(min = 1))]
    pub busy_timeout_secs: u64,

    /// Switch to WAL journaling with relaxed syncs for bulk inserts.
    pub bulk_pragmas: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IngestConfig {
    #[validate(range(min = 1))]
    pub batch_size: usize,

    #[validate(range(min = 1))]
    pub min_workers: usize,

    #[validate(length(min = 1))]
    pub archive_suffix: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_PATH.to_string(),
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT_SECS,
            bulk_pragmas: true,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            min_workers: DEFAULT_MIN_WORKERS,
            archive_suffix: ARCHIVE_SUFFIX.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration from the environment and an optional file.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("IGRA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: LoaderConfig = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database.path = path.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.ingest.batch_size = batch_size;
        self
    }

    pub fn with_min_workers(mut self, min_workers: usize) -> Self {
        self.ingest.min_workers = min_workers;
        self
    }
}
