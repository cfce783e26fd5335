//! In-process synchronous backend.
//!
//! Behaves like browser `localStorage`: string keys, string values, an
//! optional byte quota and a switch that makes every call fail the way
//! storage does in a locked-down private window.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, StoreError};
use crate::storage::traits::StorageBackend;

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
    disabled: bool,
}

impl MemoryState {
    fn used_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }
}

/// In-memory string store with optional quota.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total size of keys plus values to `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                quota: Some(bytes),
                ..MemoryState::default()
            }),
        }
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_disabled(&self, disabled: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.disabled = disabled;
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.state.lock().map(|state| state.used_bytes()).unwrap_or(0)
    }

    /// Number of stored entries across all namespaces.
    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock the state, failing if the backend is disabled or the mutex is poisoned.
    fn lock_state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Backend("memory backend poisoned".to_string()))?;
        if state.disabled {
            return Err(StoreError::Unavailable(
                "memory backend is disabled".to_string(),
            ));
        }
        Ok(state)
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock_state()?.entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.lock_state()?;
        if let Some(quota) = state.quota {
            let existing = state
                .entries
                .get(key)
                .map(|old| key.len() + old.len())
                .unwrap_or(0);
            let base = state.used_bytes() - existing;
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(base);
            if needed > available {
                return Err(StoreError::QuotaExceeded { needed, available });
            }
        }
        state.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock_state()?.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock_state()?.entries.keys().cloned().collect())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let state = self.lock_state()?;
        Ok(state
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let backend = MemoryBackend::new();
        backend.set_item("a:x", "1").unwrap();
        assert_eq!(backend.get_item("a:x").unwrap().as_deref(), Some("1"));

        backend.remove_item("a:x").unwrap();
        assert_eq!(backend.get_item("a:x").unwrap(), None);

        // Removing again is fine
        backend.remove_item("a:x").unwrap();
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let backend = MemoryBackend::with_quota(10);
        backend.set_item("k", "12345").unwrap();

        let err = backend.set_item("j", "123456789").unwrap_err();
        assert!(matches!(
            err,
            StoreError::QuotaExceeded {
                needed: 10,
                available: 4
            }
        ));
        assert_eq!(backend.get_item("j").unwrap(), None);
    }

    #[test]
    fn test_quota_counts_replacement_not_addition() {
        let backend = MemoryBackend::with_quota(6);
        backend.set_item("k", "12345").unwrap();
        // Replacing the same key reuses its space
        backend.set_item("k", "54321").unwrap();
        assert_eq!(backend.used_bytes(), 6);
    }

    #[test]
    fn test_disabled_backend_fails_every_call() {
        let backend = MemoryBackend::new();
        backend.set_item("a:x", "1").unwrap();
        backend.set_disabled(true);

        assert!(matches!(
            backend.get_item("a:x"),
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            backend.set_item("a:y", "2"),
            Err(StoreError::Unavailable(_))
        ));
        assert!(backend.keys().is_err());

        backend.set_disabled(false);
        assert_eq!(backend.get_item("a:x").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_keys_with_prefix_is_sorted_and_scoped() {
        let backend = MemoryBackend::new();
        backend.set_item("b:z", "1").unwrap();
        backend.set_item("a:y", "1").unwrap();
        backend.set_item("a:x", "1").unwrap();
        backend.set_item("ab:x", "1").unwrap();

        assert_eq!(
            backend.keys_with_prefix("a:").unwrap(),
            vec!["a:x".to_string(), "a:y".to_string()]
        );
    }
}
