use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::config::StorageConfig;
use crate::errors::CollaboratorError;
use crate::pipeline::HistoryStore;

use super::{lock, StoreError};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_name TEXT NOT NULL,
        content BLOB NOT NULL,
        checksum TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_history_created_at ON history(created_at);
"#;

/// A processed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub file_name: String,
    pub content: Vec<u8>,
    /// Hex SHA-256 of `content`.
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed history of processed files
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Open the database file, creating the table if needed
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Open `storage.database_path`
    pub fn from_config(storage: &StorageConfig) -> Result<Self, StoreError> {
        Self::new(&storage.database_path)
    }

    /// Create an in-memory store (useful for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Append a record and return its id
    pub fn record(&self, file_name: &str, bytes: &[u8]) -> Result<i64, StoreError> {
        let conn = lock(&self.conn)?;

        conn.execute(
            "INSERT INTO history (file_name, content, checksum, created_at) VALUES (?, ?, ?, ?)",
            params![file_name, bytes, checksum(bytes), Utc::now().to_rfc3339()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Most recent records first
    pub fn list(&self, limit: u32) -> Result<Vec<HistoryRecord>, StoreError> {
        let conn = lock(&self.conn)?;

        let mut stmt = conn.prepare(
            "SELECT id, file_name, content, checksum, created_at FROM history ORDER BY id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit], Self::read_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(Self::finish_row(row?)?);
        }

        Ok(records)
    }

    pub fn get(&self, id: i64) -> Result<Option<HistoryRecord>, StoreError> {
        let conn = lock(&self.conn)?;

        let row = conn
            .query_row(
                "SELECT id, file_name, content, checksum, created_at FROM history WHERE id = ?",
                params![id],
                Self::read_row,
            )
            .optional()?;

        row.map(Self::finish_row).transpose()
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
        Ok(RawRecord {
            id: row.get(0)?,
            file_name: row.get(1)?,
            content: row.get(2)?,
            checksum: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn finish_row(raw: RawRecord) -> Result<HistoryRecord, StoreError> {
        let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&raw.created_at)
            .map_err(|e| StoreError::Database(format!("Invalid timestamp: {}", e)))?
            .into();

        Ok(HistoryRecord {
            id: raw.id,
            file_name: raw.file_name,
            content: raw.content,
            checksum: raw.checksum,
            created_at,
        })
    }
}

struct RawRecord {
    id: i64,
    file_name: String,
    content: Vec<u8>,
    checksum: String,
    created_at: String,
}

fn checksum(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(&self, file_name: &str, bytes: &[u8]) -> Result<(), CollaboratorError> {
        self.record(file_name, bytes)?;
        Ok(())
    }
}
