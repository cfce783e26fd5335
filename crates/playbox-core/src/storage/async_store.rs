//! Namespaced key/value store over an asynchronous object backend.
//!
//! Same contract as [`KeyValueStore`](super::KeyValueStore), but each call
//! suspends once at the backend boundary and values are kept as structured
//! JSON rather than text.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::storage::notify::ChangeBus;
use crate::storage::traits::AsyncStorageBackend;
use crate::storage::types::{Change, Namespace, VersionCheck};

/// Namespaced view over a shared [`AsyncStorageBackend`].
pub struct AsyncKeyValueStore<B: ?Sized> {
    backend: Arc<B>,
    namespace: Namespace,
    bus: Option<ChangeBus>,
}

impl<B: ?Sized> Clone for AsyncKeyValueStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            namespace: self.namespace.clone(),
            bus: self.bus.clone(),
        }
    }
}

impl<B: AsyncStorageBackend + ?Sized> AsyncKeyValueStore<B> {
    pub fn new(backend: Arc<B>, namespace: Namespace) -> Self {
        Self {
            backend,
            namespace,
            bus: None,
        }
    }

    pub fn open(backend: Arc<B>, namespace: &str) -> Result<Self> {
        Ok(Self::new(backend, Namespace::new(namespace)?))
    }

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
    pub async fn versioned(self, version: u32) -> Self {
        if let Err(err) = self.try_versioned(version).await {
            tracing::warn!(
                namespace = %self.namespace,
                version,
                error = %err,
                "version check failed; keeping existing data"
            );
        }
        self
    }

    /// Compare the stored version marker with `version`, clearing the
    /// namespace when it is missing or different.
    pub async fn try_versioned(&self, version: u32) -> Result<VersionCheck> {
        let stored = self.stored_version().await?;
        if stored == Some(version) {
            return Ok(VersionCheck::Current);
        }

        let removed = self.remove_all().await?;
        if removed > 0 {
            self.notify(Change::Cleared);
        }
        self.backend
            .put(&self.namespace.version_key(), Value::from(version))
            .await?;

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

    pub async fn stored_version(&self) -> Result<Option<u32>> {
        let marker = self.backend.get(&self.namespace.version_key()).await?;
        Ok(marker
            .and_then(|value| value.as_u64())
            .and_then(|version| u32::try_from(version).ok()))
    }

    // --- Fallible operations ---

    pub async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let storage_key = self.namespace.storage_key(key)?;
        match self.backend.get(&storage_key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    pub async fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let storage_key = self.namespace.storage_key(key)?;
        let json =
            serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend.put(&storage_key, json.clone()).await?;
        tracing::debug!(namespace = %self.namespace, key, "stored entry");

        self.notify(Change::Set {
            key: key.to_string(),
            value: json,
        });
        Ok(())
    }

    pub async fn try_remove(&self, key: &str) -> Result<()> {
        let storage_key = self.namespace.storage_key(key)?;
        if self.backend.get(&storage_key).await?.is_none() {
            return Ok(());
        }
        self.backend.delete(&storage_key).await?;
        self.notify(Change::Removed {
            key: key.to_string(),
        });
        Ok(())
    }

    pub async fn try_clear(&self) -> Result<usize> {
        let removed = self.remove_all().await?;
        self.notify(Change::Cleared);
        Ok(removed)
    }

    pub async fn try_keys(&self) -> Result<Vec<String>> {
        let keys = self
            .backend
            .keys_with_prefix(&self.namespace.prefix())
            .await?;
        Ok(keys
            .iter()
            .filter_map(|storage_key| self.namespace.strip(storage_key))
            .map(str::to_string)
            .collect())
    }

    // --- Fail-open operations ---

    /// Read `key`, falling back to `default` when absent or unreadable.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_get(key).await {
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

    pub async fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key, T::default()).await
    }

    /// Write `value` under `key`. Returns `false` if the write failed.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let result = self.try_set(key, value).await;
        self.report("write entry", key, result)
    }

    pub async fn remove(&self, key: &str) -> bool {
        let result = self.try_remove(key).await;
        self.report("remove entry", key, result)
    }

    pub async fn clear(&self) -> bool {
        let result = self.try_clear().await.map(|_| ());
        self.report("clear namespace", "*", result)
    }

    pub async fn has(&self, key: &str) -> bool {
        let Ok(storage_key) = self.namespace.storage_key(key) else {
            return false;
        };
        matches!(self.backend.get(&storage_key).await, Ok(Some(_)))
    }

    pub async fn keys(&self) -> Vec<String> {
        match self.try_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(namespace = %self.namespace, error = %err, "failed to list keys");
                Vec::new()
            }
        }
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

    async fn remove_all(&self) -> Result<usize> {
        let keys = self
            .backend
            .keys_with_prefix(&self.namespace.prefix())
            .await?;
        for storage_key in &keys {
            self.backend.delete(storage_key).await?;
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
    use crate::storage::indexed::IndexedBackend;

    #[tokio::test]
    async fn test_score_example() {
        let store =
            AsyncKeyValueStore::open(Arc::new(IndexedBackend::in_memory()), "game").unwrap();
        assert!(store.set("score", &42).await);
        assert_eq!(store.get("score", 0).await, 42);
        assert!(store.clear().await);
        assert_eq!(store.get("score", 0).await, 0);
    }

    #[tokio::test]
    async fn test_version_marker_is_a_json_number() {
        let backend = Arc::new(IndexedBackend::in_memory());
        let store = AsyncKeyValueStore::open(Arc::clone(&backend), "game").unwrap();

        assert_eq!(
            store.try_versioned(3).await.unwrap(),
            VersionCheck::Initialized
        );
        assert_eq!(
            backend.get("game@version").await.unwrap(),
            Some(Value::from(3u32))
        );
    }
}
