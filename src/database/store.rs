//! [`KeyValueStore`] backed by the `settings` table.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use super::connection::Database;
use crate::platform::host::KeyValueStore;
use crate::types::errors::SettingsError;

/// Persistent settings store. Values are JSON-encoded per key.
///
/// Queries run on tokio's blocking pool; a locked file can hold a call for up
/// to the connection's busy timeout.
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    /// Opens the store at `path`, creating parent directories as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SettingsError::StorageError(format!("Failed to create config directory: {}", e))
            })?;
        }
        Ok(Self {
            db: Arc::new(Mutex::new(Database::open(path)?)),
        })
    }

    pub fn open_in_memory() -> Result<Self, SettingsError> {
        Ok(Self {
            db: Arc::new(Mutex::new(Database::open_in_memory()?)),
        })
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T, SettingsError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, SettingsError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let db = db
                .lock()
                .map_err(|e| SettingsError::StorageError(e.to_string()))?;
            f(&db)
        })
        .await
        .map_err(|e| SettingsError::StorageError(format!("Settings query aborted: {}", e)))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        let owned = key.to_string();
        let raw: Option<String> = self
            .with_db(move |db| {
                Ok(db
                    .connection()
                    .query_row(
                        "SELECT value FROM settings WHERE key = ?1",
                        params![owned],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;

        match raw {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| SettingsError::SerializationError(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let text = serde_json::to_string(&value)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let key = key.to_string();
        self.with_db(move |db| {
            db.connection().execute(
                "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, text, now],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), SettingsError> {
        let key = key.to_string();
        self.with_db(move |db| {
            db.connection()
                .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
    }
}
