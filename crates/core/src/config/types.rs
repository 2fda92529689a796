use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dispatcher::DispatcherConfig;
use crate::pipeline::PipelineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatcherConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Storage configuration for the bundled adapters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// SQLite database holding settings and history
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Directory uploaded source files are written to
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            uploads_dir: default_uploads_dir(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("remit.db")
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}
