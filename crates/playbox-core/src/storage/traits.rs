//! Storage backend trait definitions.
//!
//! A backend is the physical medium under a [`KeyValueStore`]. It knows
//! nothing about namespaces, versions or serialization; it only moves keys and
//! values. Two flavors exist, matching the two kinds of browser storage the
//! games run against:
//!
//! - [`StorageBackend`]: synchronous, string-to-string (like `localStorage`)
//! - [`AsyncStorageBackend`]: asynchronous object store (like IndexedDB)
//!
//! [`KeyValueStore`]: super::KeyValueStore

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Synchronous key-string-to-string storage.
///
/// All implementations must ensure:
/// - Methods take `&self`; mutation goes through interior mutability
/// - Removing a missing key succeeds
/// - `keys` returns every stored key, including other namespaces' keys
pub trait StorageBackend: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::QuotaExceeded` if the backend is full, or
    /// `StoreError::Unavailable` if the backend is disabled.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key` if present.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// List every key in the backend.
    fn keys(&self) -> Result<Vec<String>>;

    /// List keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Asynchronous object storage holding structured JSON values.
///
/// Calls suspend only at the storage boundary; no two calls for the same key
/// are expected to interleave.
#[async_trait]
pub trait AsyncStorageBackend: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Delete `key` if present.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List every key in the backend.
    async fn keys(&self) -> Result<Vec<String>>;

    /// List keys starting with `prefix`, sorted.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .keys()
            .await?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }
}
