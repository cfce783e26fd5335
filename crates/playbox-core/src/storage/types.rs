//! Core data types for the storage layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Separator between a namespace and a key in the backend's key space.
pub const KEY_SEPARATOR: char = ':';

/// Suffix of the physical key holding a namespace's schema version.
pub const VERSION_SUFFIX: &str = "@version";

/// A key prefix isolating one consumer's entries from every other consumer
/// sharing the same backend.
///
/// Namespaces cannot contain `:` or `@`, so the namespace part of a storage
/// key is never ambiguous and a version marker can never collide with an
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StoreError::InvalidNamespace(
                "namespace cannot be empty".to_string(),
            ));
        }
        if let Some(bad) = name.chars().find(|c| *c == KEY_SEPARATOR || *c == '@') {
            return Err(StoreError::InvalidNamespace(format!(
                "namespace '{}' cannot contain '{}'",
                name, bad
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix shared by every storage key in this namespace (`"<ns>:"`).
    pub fn prefix(&self) -> String {
        format!("{}{}", self.0, KEY_SEPARATOR)
    }

    /// Physical key for `key` in this namespace (`"<ns>:<key>"`).
    pub fn storage_key(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("key cannot be empty".to_string()));
        }
        Ok(format!("{}{}{}", self.0, KEY_SEPARATOR, key))
    }

    /// Physical key of the version marker (`"<ns>@version"`).
    pub fn version_key(&self) -> String {
        format!("{}{}", self.0, VERSION_SUFFIX)
    }

    /// Strip this namespace's prefix from a storage key.
    ///
    /// Returns `None` for keys belonging to another namespace.
    pub fn strip<'a>(&self, storage_key: &'a str) -> Option<&'a str> {
        storage_key
            .strip_prefix(self.0.as_str())
            .and_then(|rest| rest.strip_prefix(KEY_SEPARATOR))
            .filter(|key| !key.is_empty())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Namespace {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(namespace: Namespace) -> Self {
        namespace.0
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A successful mutation of a namespace, as seen by change listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// `key` now holds `value`
    Set {
        key: String,
        value: serde_json::Value,
    },

    /// `key` was deleted
    Removed { key: String },

    /// Every entry of the namespace was deleted
    Cleared,
}

impl Change {
    /// The key this change touched, or `None` for a clear.
    pub fn key(&self) -> Option<&str> {
        match self {
            Change::Set { key, .. } | Change::Removed { key } => Some(key),
            Change::Cleared => None,
        }
    }

    /// The new value, if the change wrote one.
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            Change::Set { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Outcome of checking a store's version marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    /// Stored version matched; data kept
    Current,

    /// Namespace was empty and unversioned; marker written
    Initialized,

    /// Stored data belonged to another (or no) version and was cleared
    Reset { from: Option<u32> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_rejects_reserved_characters() {
        assert!(Namespace::new("").is_err());
        assert!(Namespace::new("   ").is_err());
        assert!(Namespace::new("a:b").is_err());
        assert!(Namespace::new("a@b").is_err());
        assert!(Namespace::new("tic-tac-toe").is_ok());
    }

    #[test]
    fn test_storage_key_layout() {
        let ns = Namespace::new("memory-cards").unwrap();
        assert_eq!(ns.storage_key("best").unwrap(), "memory-cards:best");
        assert_eq!(ns.storage_key("grid:4x4").unwrap(), "memory-cards:grid:4x4");
        assert_eq!(ns.version_key(), "memory-cards@version");
        assert!(ns.storage_key("").is_err());
    }

    #[test]
    fn test_strip_only_matches_own_namespace() {
        let ns = Namespace::new("game").unwrap();
        assert_eq!(ns.strip("game:score"), Some("score"));
        assert_eq!(ns.strip("game:a:b"), Some("a:b"));
        assert_eq!(ns.strip("games:score"), None);
        assert_eq!(ns.strip("game@version"), None);
        assert_eq!(ns.strip("game:"), None);
    }

    #[test]
    fn test_namespace_serde_validates() {
        let ns: Namespace = serde_json::from_str("\"settings\"").unwrap();
        assert_eq!(ns.as_str(), "settings");
        assert!(serde_json::from_str::<Namespace>("\"bad:ns\"").is_err());
    }

    #[test]
    fn test_change_accessors() {
        let change = Change::Set {
            key: "score".to_string(),
            value: serde_json::json!(42),
        };
        assert_eq!(change.key(), Some("score"));
        assert_eq!(change.value(), Some(&serde_json::json!(42)));
        assert_eq!(Change::Cleared.key(), None);
    }
}
