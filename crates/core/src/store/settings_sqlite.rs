use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::StorageConfig;
use crate::errors::CollaboratorError;
use crate::pipeline::{RecipientMapping, RecipientMappingStore, RecipientSettings};

use super::{lock, StoreError};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        sender_address TEXT NOT NULL DEFAULT '',
        recipient_mapping TEXT
    );

    INSERT OR IGNORE INTO settings (id) VALUES (1);
"#;

/// SQLite-backed single-row settings
pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
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

    pub fn set_sender_address(&self, address: &str) -> Result<(), StoreError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "UPDATE settings SET sender_address = ? WHERE id = 1",
            params![address.trim()],
        )?;
        Ok(())
    }

    /// Replace the whole mapping
    pub fn set_recipient_mapping(&self, mapping: &RecipientMapping) -> Result<(), StoreError> {
        let json = serde_json::to_string(mapping)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let conn = lock(&self.conn)?;
        conn.execute(
            "UPDATE settings SET recipient_mapping = ? WHERE id = 1",
            params![json],
        )?;
        Ok(())
    }

    pub fn load(&self) -> Result<RecipientSettings, StoreError> {
        let conn = lock(&self.conn)?;

        let row: Option<(String, Option<String>)> = conn
            .query_row(
                "SELECT sender_address, recipient_mapping FROM settings WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((sender_address, mapping_json)) = row else {
            return Ok(RecipientSettings::default());
        };

        let mapping = mapping_json
            .map(|json| serde_json::from_str::<RecipientMapping>(&json))
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(RecipientSettings {
            mapping,
            sender_address,
        })
    }
}

#[async_trait]
impl RecipientMappingStore for SqliteSettingsStore {
    async fn get(&self) -> Result<RecipientSettings, CollaboratorError> {
        Ok(self.load()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Beneficiary;

    #[test]
    fn test_empty_settings() {
        let store = SqliteSettingsStore::in_memory().unwrap();
        let settings = store.load().unwrap();
        assert!(settings.mapping.is_none());
        assert!(settings.sender_address.is_empty());
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let store = SqliteSettingsStore::in_memory().unwrap();
        store.set_sender_address(" billing@example.com ").unwrap();
        let mapping: RecipientMapping = [("Ivanov Ivan", "ivanov@example.com")]
            .into_iter()
            .collect();
        store.set_recipient_mapping(&mapping).unwrap();

        let settings = store.get().await.unwrap();
        assert_eq!(settings.sender_address, "billing@example.com");
        let mapping = settings.mapping.unwrap();
        assert_eq!(
            mapping.resolve(&Beneficiary::new("IVANOV IVAN", "1")),
            Some("ivanov@example.com")
        );
    }

    #[test]
    fn test_settings_persist_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remit.db");

        {
            let store = SqliteSettingsStore::new(&path).unwrap();
            store.set_sender_address("billing@example.com").unwrap();
        }

        let store = SqliteSettingsStore::new(&path).unwrap();
        assert_eq!(store.load().unwrap().sender_address, "billing@example.com");
    }
}
