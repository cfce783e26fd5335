//! SQLite-backed synchronous storage.
//!
//! One table, one row per physical key. Writes go straight to the database,
//! so nothing is lost if the process exits without closing the store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::storage::traits::StorageBackend;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS entries (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
"#;

/// Durable string store in a single SQLite file.
pub struct SqliteBackend {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`.
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Database file path, or `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("SQLite connection poisoned".to_string()))
    }
}

impl StorageBackend for SqliteBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT key FROM entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        // substr avoids LIKE wildcard escaping for keys containing '%' or '_'
        let mut stmt = conn.prepare(
            "SELECT key FROM entries WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_value() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.set_item("ns:k", "1").unwrap();
        backend.set_item("ns:k", "2").unwrap();

        assert_eq!(backend.get_item("ns:k").unwrap().as_deref(), Some("2"));
        assert_eq!(backend.keys().unwrap(), vec!["ns:k".to_string()]);
    }

    #[test]
    fn test_prefix_does_not_treat_underscore_as_wildcard() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.set_item("a_b:k", "1").unwrap();
        backend.set_item("axb:k", "1").unwrap();

        assert_eq!(
            backend.keys_with_prefix("a_b:").unwrap(),
            vec!["a_b:k".to_string()]
        );
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.remove_item("ns:missing").unwrap();
        assert!(backend.path().is_none());
    }
}
