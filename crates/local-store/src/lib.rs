//! Pending batch records in a local SQLite database.
//!
//! Every `tabsum` invocation opens its own connection, so the database is
//! the only thing serializing writers across processes. WAL mode plus a busy
//! timeout lets concurrent hosts stage and claim records without losing each
//! other's writes.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tabsum_core::ports::RecordStore;
use tracing::debug;

pub const STORE_FILE_NAME: &str = "pending.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS records (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);";

#[derive(Debug, thiserror::Error)]
pub enum LocalStoreError {
    #[error("could not determine home directory")]
    HomeUnavailable,
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default store location (`~/.local/share/tabsum/pending.db`).
pub fn default_store_path() -> Result<PathBuf, LocalStoreError> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .map_err(|_| LocalStoreError::HomeUnavailable)?;
    Ok(home
        .join(".local")
        .join("share")
        .join("tabsum")
        .join(STORE_FILE_NAME))
}

/// Record store over one SQLite table. Shareable via `Arc<SqliteRecordStore>`.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, LocalStoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        debug!("Opened pending batch store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn decode(raw: Option<String>) -> Result<Option<Value>, LocalStoreError> {
        raw.map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(LocalStoreError::from)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let raw = self
            .conn()
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(LocalStoreError::from)?;
        Ok(Self::decode(raw)?)
    }

    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        let raw = serde_json::to_string(&value).map_err(LocalStoreError::from)?;
        self.conn()
            .execute(
                "INSERT INTO records (key, value) VALUES (?1, ?2) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, raw],
            )
            .map_err(LocalStoreError::from)?;
        debug!("Stored {key}");
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let removed = self
            .conn()
            .execute("DELETE FROM records WHERE key = ?1", params![key])
            .map_err(LocalStoreError::from)?;
        if removed > 0 {
            debug!("Deleted {key}");
        }
        Ok(())
    }

    async fn take(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let raw = self
            .conn()
            .query_row(
                "DELETE FROM records WHERE key = ?1 RETURNING value",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(LocalStoreError::from)?;
        if raw.is_some() {
            debug!("Took {key}");
        }
        Ok(Self::decode(raw)?)
    }

    async fn keys(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT key FROM records WHERE substr(key, 1, length(?1)) = ?1")
            .map_err(LocalStoreError::from)?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))
            .map_err(LocalStoreError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(LocalStoreError::from)?;
        Ok(keys)
    }
}
