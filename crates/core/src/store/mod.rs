//! Storage adapters for the pipeline's collaborators.
//!
//! - [`FsSourceStore`]: uploaded files on the local filesystem
//! - [`SqliteHistoryStore`]: append-only record of processed files
//! - [`SqliteSettingsStore`]: sender address and recipient mapping

mod fs;
mod history_sqlite;
mod settings_sqlite;

pub use fs::FsSourceStore;
pub use history_sqlite::{HistoryRecord, SqliteHistoryStore};
pub use settings_sqlite::SqliteSettingsStore;

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use thiserror::Error;

use crate::errors::CollaboratorError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<StoreError> for CollaboratorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidFileName(_) => CollaboratorError::user(err.to_string()),
            _ => CollaboratorError::system(err.to_string()).with_source(err),
        }
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
}
