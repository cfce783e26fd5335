//! Language and sound settings shared by every game.
//!
//! Settings are a plain value loaded from and saved to a [`KeyValueStore`];
//! there is no process-wide settings singleton.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::storage::{KeyValueStore, StorageBackend};

/// Namespace holding the settings record.
pub const SETTINGS_NAMESPACE: &str = "settings";

/// Key of the settings record inside [`SETTINGS_NAMESPACE`].
pub const SETTINGS_KEY: &str = "app";

pub const MAX_VOLUME: u8 = 100;

/// Interface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    Pt,
    Ja,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::Pt,
        Language::Ja,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Pt => "pt",
            Language::Ja => "ja",
        }
    }

    /// Name of the language in that language.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Español",
            Language::Fr => "Français",
            Language::De => "Deutsch",
            Language::Pt => "Português",
            Language::Ja => "日本語",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|language| language.code() == code)
            .ok_or_else(|| StoreError::Deserialization(format!("unknown language code '{}'", s)))
    }
}

/// Settings record persisted under `settings:app`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub language: Language,
    pub sound_enabled: bool,
    /// 0..=100
    pub volume: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: Language::En,
            sound_enabled: true,
            volume: 80,
        }
    }
}

impl Settings {
    /// Volume actually applied to audio, as a 0.0..=1.0 gain.
    pub fn effective_gain(&self) -> f32 {
        if self.sound_enabled {
            f32::from(self.volume.min(MAX_VOLUME)) / f32::from(MAX_VOLUME)
        } else {
            0.0
        }
    }
}

/// Read/write access to the settings record.
pub trait SettingsAccess {
    /// Current settings, or defaults if none are stored or they are unreadable.
    fn load(&self) -> Settings;

    /// Persist `settings`. Returns `false` if the write failed.
    fn save(&self, settings: &Settings) -> bool;

    /// Load, apply `change`, save, and return the new settings.
    ///
    /// The returned value reflects `change` even when saving failed.
    fn update<F>(&self, change: F) -> Settings
    where
        F: FnOnce(&mut Settings),
        Self: Sized,
    {
        let mut settings = self.load();
        change(&mut settings);
        self.save(&settings);
        settings
    }
}

/// [`SettingsAccess`] backed by a key/value store.
pub struct StoredSettings<B: ?Sized> {
    store: KeyValueStore<B>,
}

impl<B: StorageBackend + ?Sized> StoredSettings<B> {
    pub fn new(backend: Arc<B>) -> Result<Self> {
        Ok(Self {
            store: KeyValueStore::open(backend, SETTINGS_NAMESPACE)?,
        })
    }

    /// Use an existing store (for instance one with notifications enabled).
    pub fn from_store(store: KeyValueStore<B>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &KeyValueStore<B> {
        &self.store
    }
}

impl<B: StorageBackend + ?Sized> SettingsAccess for StoredSettings<B> {
    fn load(&self) -> Settings {
        self.store.get_or_default(SETTINGS_KEY)
    }

    fn save(&self, settings: &Settings) -> bool {
        let mut clamped = settings.clone();
        clamped.volume = clamped.volume.min(MAX_VOLUME);
        self.store.set(SETTINGS_KEY, &clamped)
    }
}
