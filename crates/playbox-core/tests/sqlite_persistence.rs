use std::sync::Arc;

use playbox_core::games::{GameSlot, MemoryBest, MemoryCardsSave};
use playbox_core::settings::{Language, SettingsAccess, StoredSettings};
use playbox_core::storage::{KeyValueStore, SqliteBackend, StorageBackend};
use tempfile::tempdir;

#[test]
fn test_entries_survive_reopen() {
    let dir = tempdir().expect("tempdir should be available");
    let path = dir.path().join("saves").join("playbox.db");

    {
        let backend = Arc::new(SqliteBackend::open(&path).expect("open should succeed"));
        let store = KeyValueStore::open(backend, "number-touch").expect("valid namespace");
        assert!(store.set("level", &4));
    }

    assert!(path.exists());
    let backend = Arc::new(SqliteBackend::open(&path).expect("reopen should succeed"));
    let store = KeyValueStore::open(Arc::clone(&backend), "number-touch").expect("valid namespace");
    assert_eq!(store.get("level", 1), 4);
    assert_eq!(backend.path(), Some(path.as_path()));
}

#[test]
fn test_settings_and_game_saves_share_one_file() {
    let dir = tempdir().expect("tempdir should be available");
    let path = dir.path().join("playbox.db");
    let backend = Arc::new(SqliteBackend::open(&path).expect("open should succeed"));

    let settings = StoredSettings::new(Arc::clone(&backend)).expect("settings namespace");
    settings.update(|s| s.language = Language::De);

    let slot: GameSlot<_, MemoryCardsSave> =
        GameSlot::open(Arc::clone(&backend)).expect("game namespace");
    slot.update(|save| {
        save.record("3x4", MemoryBest { moves: 12, seconds: 40 });
    });

    let mut keys = backend.keys().expect("keys should list");
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "memory-cards:save".to_string(),
            "memory-cards@version".to_string(),
            "settings:app".to_string(),
        ]
    );

    assert!(slot.reset());
    assert_eq!(settings.load().language, Language::De);
}

#[test]
fn test_corrupt_row_degrades_to_default() {
    let dir = tempdir().expect("tempdir should be available");
    let backend =
        Arc::new(SqliteBackend::open(dir.path().join("playbox.db")).expect("open should succeed"));
    backend
        .set_item("settings:app", "<<<garbage>>>")
        .expect("raw write should succeed");

    let settings = StoredSettings::new(Arc::clone(&backend)).expect("settings namespace");
    assert_eq!(settings.load().language, Language::En);

    // Saving over the corrupt row repairs it
    assert!(settings.save(&settings.load()));
    assert!(settings.store().try_get::<serde_json::Value>("app").is_ok());
}
