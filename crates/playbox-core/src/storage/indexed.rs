//! Asynchronous object-store backend.
//!
//! Holds structured JSON values in memory behind a `tokio` lock. When bound
//! to a snapshot file, the whole map is loaded on open and rewritten
//! atomically after every mutation; a failed snapshot write leaves the
//! in-memory map untouched.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::storage::traits::AsyncStorageBackend;

type Entries = BTreeMap<String, Value>;

/// Object store with optional JSON snapshot persistence.
#[derive(Debug, Default)]
pub struct IndexedBackend {
    entries: RwLock<Entries>,
    snapshot: Option<PathBuf>,
}

impl IndexedBackend {
    /// Create a store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store persisted to `path`.
    ///
    /// A missing file starts an empty store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Deserialization` if the snapshot exists but is not
    /// a JSON object, so a corrupt file is never silently overwritten.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Entries>(&bytes).map_err(|e| {
                StoreError::Deserialization(format!(
                    "Snapshot {} is corrupt: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => Entries::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "opened object store");
        Ok(Self {
            entries: RwLock::new(entries),
            snapshot: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    /// Apply `change` and persist the result.
    ///
    /// `change` returns whether it modified the map; unchanged maps are not
    /// rewritten.
    async fn mutate<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Entries) -> bool + Send,
    {
        let mut entries = self.entries.write().await;
        let Some(path) = self.snapshot.clone() else {
            change(&mut entries);
            return Ok(());
        };

        let mut next = entries.clone();
        if !change(&mut next) {
            return Ok(());
        }
        let data = serde_json::to_vec_pretty(&next)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::task::spawn_blocking(move || crate::fs::write_atomic(&path, &data))
            .await
            .map_err(|e| StoreError::Backend(format!("Snapshot writer failed: {}", e)))??;
        *entries = next;
        Ok(())
    }
}

#[async_trait]
impl AsyncStorageBackend for IndexedBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let key = key.to_string();
        self.mutate(move |entries| {
            entries.insert(key, value);
            true
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.mutate(|entries| entries.remove(key).is_some()).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
