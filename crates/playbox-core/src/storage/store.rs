//! Namespaced key/value store over a synchronous backend.
//!
//! Every entry lives at `"<namespace>:<key>"` in the backend and holds JSON
//! text. The plain operations (`get`, `set`, `remove`, `clear`) fail open:
//! reads fall back to the caller's default and writes report `false`, with
//! the cause logged as a warning. The `try_*` twins return the error instead.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::storage::notify::ChangeBus;
use crate::storage::traits::StorageBackend;
use crate::storage::types::{Change, Namespace, VersionCheck};

/// Namespaced view over a shared [`StorageBackend`].
pub struct KeyValueStore<B: ?Sized> {
    backend: Arc<B>,
    namespace: Namespace,
    bus: Option<ChangeBus>,
}

impl<B: ?Sized> Clone for KeyValueStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            namespace: self.namespace.clone(),
            bus: self.bus.clone(),
        }
    }
}

impl<B: StorageBackend + ?Sized> KeyValueStore<B> {
    pub fn new(backend: Arc<B>, namespace: Namespace) -> Self {
        Self {
            backend,
            namespace,
            bus: None,
        }
    }

    /// Create a store for the namespace named `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidNamespace` if the name is empty or
    /// contains `:` or `@`.
    pub fn open(backend: Arc<B>, namespace: &str) -> Result<Self> {
        Ok(Self::new(backend, Namespace::new(namespace)?))
    }

    /// Announce successful mutations on `bus`.
    pub fn with_notifications(mut self, bus: ChangeBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Bring the namespace to schema `version`, logging instead of failing.
    ///
    /// See [`KeyValueStore::try_versioned`].
    pub fn versioned(self, version: u32) -> Self {
        if let Err(err) = self.try_versioned(version) {
            tracing::warn!(
                namespace = %self.namespace,
                version,
                error = %err,
                "version check failed; keeping existing data"
            );
        }
        self
    }

    /// Compare the stored version marker with `version`.
    ///
    /// A matching marker keeps the data. A missing or different marker clears
    /// the namespace and records `version`.
    pub fn try_versioned(&self, version: u32) -> Result<VersionCheck> {
        let stored = self.stored_version()?;
        if stored == Some(version) {
            return Ok(VersionCheck::Current);
        }

        let removed = self.remove_all()?;
        if removed > 0 {
            self.notify(Change::Cleared);
        }
        self.backend
            .set_item(&self.namespace.version_key(), &version.to_string())?;

        if stored.is_none() && removed == 0 {
            tracing::debug!(namespace = %self.namespace, version, "initialized namespace version");
            Ok(VersionCheck::Initialized)
        } else {
            tracing::info!(
                namespace = %self.namespace,
                from = ?stored,
                to = version,
                removed,
                "namespace version changed; cleared stored entries"
            );
            Ok(VersionCheck::Reset { from: stored })
        }
    }

    /// Schema version recorded for this namespace, if any.
    ///
    /// An unreadable marker counts as no marker.
    pub fn stored_version(&self) -> Result<Option<u32>> {
        let raw = self.backend.get_item(&self.namespace.version_key())?;
        Ok(raw.and_then(|raw| raw.trim().parse().ok()))
    }

    // --- Fallible operations ---

    /// Read and deserialize `key`.
    ///
    /// Returns `Ok(None)` if the key was never written.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let storage_key = self.namespace.storage_key(key)?;
        match self.backend.get_item(&storage_key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Serialize `value` and write it under `key`.
    pub fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let storage_key = self.namespace.storage_key(key)?;
        let json =
            serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let raw =
            serde_json::to_string(&json).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend.set_item(&storage_key, &raw)?;
        tracing::debug!(namespace = %self.namespace, key, bytes = raw.len(), "stored entry");

        self.notify(Change::Set {
            key: key.to_string(),
            value: json,
        });
        Ok(())
    }

    /// Delete `key`. Deleting an absent key is a silent no-op.
    pub fn try_remove(&self, key: &str) -> Result<()> {
        let storage_key = self.namespace.storage_key(key)?;
        if self.backend.get_item(&storage_key)?.is_none() {
            return Ok(());
        }
        self.backend.remove_item(&storage_key)?;
        self.notify(Change::Removed {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Delete every entry in this namespace and no other.
    ///
    /// Returns the number of entries removed. The version marker is kept.
    pub fn try_clear(&self) -> Result<usize> {
        let removed = self.remove_all()?;
        self.notify(Change::Cleared);
        Ok(removed)
    }

    /// Keys in this namespace (without the prefix), sorted.
    pub fn try_keys(&self) -> Result<Vec<String>> {
        let keys = self.backend.keys_with_prefix(&self.namespace.prefix())?;
        Ok(keys
            .iter()
            .filter_map(|storage_key| self.namespace.strip(storage_key))
            .map(str::to_string)
            .collect())
    }

    /// Raw JSON text of every entry in this namespace, sorted by key.
    pub fn try_entries(&self) -> Result<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for key in self.try_keys()? {
            if let Some(raw) = self.backend.get_item(&self.namespace.storage_key(&key)?)? {
                entries.push((key, raw));
            }
        }
        Ok(entries)
    }

    // --- Fail-open operations ---

    /// Read `key`, falling back to `default` when absent or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_get(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(err) => {
                tracing::warn!(
                    namespace = %self.namespace,
                    key,
                    error = %err,
                    "failed to read entry; using default"
                );
                default
            }
        }
    }

    /// Read `key`, falling back to `T::default()`.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key, T::default())
    }

    /// Write `value` under `key`. Returns `false` if the write failed.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        self.report("write entry", key, self.try_set(key, value))
    }

    /// Delete `key`. Returns `false` only if the backend failed.
    pub fn remove(&self, key: &str) -> bool {
        self.report("remove entry", key, self.try_remove(key))
    }

    /// Delete every entry in this namespace. Returns `false` if the backend failed.
    pub fn clear(&self) -> bool {
        self.report("clear namespace", "*", self.try_clear().map(|_| ()))
    }

    /// Whether `key` currently holds an entry.
    pub fn has(&self, key: &str) -> bool {
        self.namespace
            .storage_key(key)
            .and_then(|storage_key| self.backend.get_item(&storage_key))
            .map(|raw| raw.is_some())
            .unwrap_or(false)
    }

    /// Keys in this namespace, or an empty list if the backend failed.
    pub fn keys(&self) -> Vec<String> {
        self.try_keys().unwrap_or_else(|err| {
            tracing::warn!(namespace = %self.namespace, error = %err, "failed to list keys");
            Vec::new()
        })
    }

    fn report(&self, action: &str, key: &str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    namespace = %self.namespace,
                    key,
                    error = %err,
                    "failed to {}",
                    action
                );
                false
            }
        }
    }

    fn remove_all(&self) -> Result<usize> {
        let keys = self.backend.keys_with_prefix(&self.namespace.prefix())?;
        for storage_key in &keys {
            self.backend.remove_item(storage_key)?;
        }
        Ok(keys.len())
    }

    fn notify(&self, change: Change) {
        if let Some(bus) = &self.bus {
            bus.publish(&self.namespace, &change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryBackend;

    fn store(namespace: &str) -> KeyValueStore<MemoryBackend> {
        KeyValueStore::open(Arc::new(MemoryBackend::new()), namespace).unwrap()
    }

    #[test]
    fn test_score_example() {
        let store = store("game");
        assert!(store.set("score", &42));
        assert_eq!(store.get("score", 0), 42);
        assert!(store.clear());
        assert_eq!(store.get("score", 0), 0);
    }

    #[test]
    fn test_persisted_representation_is_json_under_prefixed_key() {
        let store = store("game");
        store.set("board", &vec!["x", "o"]);
        assert_eq!(
            store.backend().get_item("game:board").unwrap().as_deref(),
            Some(r#"["x","o"]"#)
        );
    }

    #[test]
    fn test_type_mismatch_returns_default() {
        let store = store("game");
        store.set("score", "not a number");
        assert_eq!(store.get("score", 7u32), 7);
        assert!(store.try_get::<u32>("score").is_err());
    }

    #[test]
    fn test_empty_key_fails_open() {
        let store = store("game");
        assert!(!store.set("", &1));
        assert_eq!(store.get("", 5), 5);
        assert!(!store.has(""));
    }

    #[test]
    fn test_remove_absent_key_is_ok() {
        let store = store("game");
        assert!(store.remove("never-written"));
        assert!(store.try_remove("never-written").is_ok());
    }

    #[test]
    fn test_keys_are_stripped_and_sorted() {
        let store = store("game");
        store.set("b", &1);
        store.set("a", &1);
        store.set("a:nested", &1);
        assert_eq!(store.keys(), vec!["a", "a:nested", "b"]);
    }

    #[test]
    fn test_stored_version_ignores_garbage_marker() {
        let store = store("game");
        store
            .backend()
            .set_item("game@version", "banana")
            .unwrap();
        assert_eq!(store.stored_version().unwrap(), None);
    }
}
