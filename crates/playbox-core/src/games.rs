//! Game identifiers and per-game save records.
//!
//! Each game owns one namespace and one save record type. The store itself
//! stays payload agnostic; [`GameSlot`] only adds the typing.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::storage::{KeyValueStore, Namespace, StorageBackend};

/// The games in the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameId {
    ColorMixer,
    MemoryCards,
    MelodyMaker,
    NumberTouch,
    TicTacToe,
}

impl GameId {
    pub const ALL: [GameId; 5] = [
        GameId::ColorMixer,
        GameId::MemoryCards,
        GameId::MelodyMaker,
        GameId::NumberTouch,
        GameId::TicTacToe,
    ];

    /// Stable namespace slug for this game's entries.
    pub fn slug(&self) -> &'static str {
        match self {
            GameId::ColorMixer => "color-mixer",
            GameId::MemoryCards => "memory-cards",
            GameId::MelodyMaker => "melody-maker",
            GameId::NumberTouch => "number-touch",
            GameId::TicTacToe => "tic-tac-toe",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameId::ColorMixer => "Color Mixer",
            GameId::MemoryCards => "Memory Cards",
            GameId::MelodyMaker => "Melody Maker",
            GameId::NumberTouch => "Number Touch",
            GameId::TicTacToe => "Tic-Tac-Toe",
        }
    }

    pub fn namespace(&self) -> Result<Namespace> {
        Namespace::new(self.slug())
    }

    /// [`GameSave::VERSION`] of this game's save record.
    pub fn schema_version(&self) -> u32 {
        match self {
            GameId::ColorMixer => ColorMixerSave::VERSION,
            GameId::MemoryCards => MemoryCardsSave::VERSION,
            GameId::MelodyMaker => MelodyMakerSave::VERSION,
            GameId::NumberTouch => NumberTouchSave::VERSION,
            GameId::TicTacToe => TicTacToeSave::VERSION,
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for GameId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let slug = s.trim().to_ascii_lowercase();
        GameId::ALL
            .into_iter()
            .find(|game| game.slug() == slug)
            .ok_or_else(|| StoreError::InvalidNamespace(format!("unknown game '{}'", s)))
    }
}

/// A game's save record.
pub trait GameSave: Serialize + DeserializeOwned + Default {
    /// Game owning this record.
    const GAME: GameId;

    /// Schema version. Bumping it discards saves written by older versions.
    const VERSION: u32;

    /// Key of the record inside the game's namespace.
    const KEY: &'static str = "save";
}

/// Typed handle on one game's save record.
pub struct GameSlot<B: ?Sized, T> {
    store: KeyValueStore<B>,
    _record: PhantomData<fn() -> T>,
}

impl<B: StorageBackend + ?Sized, T: GameSave> GameSlot<B, T> {
    /// Open the slot, discarding saves from another schema version.
    pub fn open(backend: Arc<B>) -> Result<Self> {
        let store = KeyValueStore::new(backend, T::GAME.namespace()?).versioned(T::VERSION);
        Ok(Self::from_store(store))
    }

    /// Wrap an already prepared store (e.g. one with notifications).
    pub fn from_store(store: KeyValueStore<B>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Saved record, or a fresh one if absent or unreadable.
    pub fn load(&self) -> T {
        self.store.get_or_default(T::KEY)
    }

    pub fn save(&self, record: &T) -> bool {
        self.store.set(T::KEY, record)
    }

    /// Load, apply `change`, save; returns the updated record.
    pub fn update<F: FnOnce(&mut T)>(&self, change: F) -> T {
        let mut record = self.load();
        change(&mut record);
        self.save(&record);
        record
    }

    /// Forget everything this game saved.
    pub fn reset(&self) -> bool {
        self.store.clear()
    }

    pub fn store(&self) -> &KeyValueStore<B> {
        &self.store
    }
}

/// One mix the child kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMix {
    /// Source colors as `#rrggbb`
    pub ingredients: Vec<String>,
    /// Resulting color as `#rrggbb`
    pub result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorMixerSave {
    pub saved_mixes: Vec<SavedMix>,
}

impl ColorMixerSave {
    pub const MAX_SAVED: usize = 12;

    /// Keep `mix`, dropping the oldest once the shelf is full.
    pub fn keep(&mut self, mix: SavedMix) {
        self.saved_mixes.push(mix);
        if self.saved_mixes.len() > Self::MAX_SAVED {
            let overflow = self.saved_mixes.len() - Self::MAX_SAVED;
            self.saved_mixes.drain(..overflow);
        }
    }
}

impl GameSave for ColorMixerSave {
    const GAME: GameId = GameId::ColorMixer;
    const VERSION: u32 = 1;
}

/// Best result on one memory grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryBest {
    pub moves: u32,
    pub seconds: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryCardsSave {
    /// Keyed by grid size label, e.g. `"4x4"`
    pub best: BTreeMap<String, MemoryBest>,
}

impl MemoryCardsSave {
    /// Record a finished game. Fewer moves wins; ties go to the faster time.
    ///
    /// Returns `true` if this is a new best for the grid.
    pub fn record(&mut self, grid: &str, result: MemoryBest) -> bool {
        let improved = match self.best.get(grid) {
            Some(best) => (result.moves, result.seconds) < (best.moves, best.seconds),
            None => true,
        };
        if improved {
            self.best.insert(grid.to_string(), result);
        }
        improved
    }
}

impl GameSave for MemoryCardsSave {
    const GAME: GameId = GameId::MemoryCards;
    const VERSION: u32 = 1;
}

/// A saved melody: note names (`"C4"`, `"rest"`) played at `tempo` bpm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Melody {
    pub name: String,
    pub notes: Vec<String>,
    pub tempo: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MelodyMakerSave {
    pub melodies: Vec<Melody>,
}

impl MelodyMakerSave {
    /// Insert or replace the melody with the same name.
    pub fn upsert(&mut self, melody: Melody) {
        match self.melodies.iter_mut().find(|m| m.name == melody.name) {
            Some(existing) => *existing = melody,
            None => self.melodies.push(melody),
        }
    }
}

impl GameSave for MelodyMakerSave {
    const GAME: GameId = GameId::MelodyMaker;
    const VERSION: u32 = 1;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedBest {
    pub millis: u64,
    pub achieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberTouchSave {
    /// Fastest clear time per level
    pub best_times: BTreeMap<u8, TimedBest>,
}

impl NumberTouchSave {
    /// Returns `true` if `millis` beats the stored time for `level`.
    pub fn record(&mut self, level: u8, millis: u64, at: DateTime<Utc>) -> bool {
        let improved = self
            .best_times
            .get(&level)
            .map_or(true, |best| millis < best.millis);
        if improved {
            self.best_times.insert(
                level,
                TimedBest {
                    millis,
                    achieved_at: at,
                },
            );
        }
        improved
    }
}

impl GameSave for NumberTouchSave {
    const GAME: GameId = GameId::NumberTouch;
    const VERSION: u32 = 1;
}

/// Result of one tic-tac-toe round, from the child's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicTacToeSave {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub last_played: Option<DateTime<Utc>>,
}

impl TicTacToeSave {
    pub fn record(&mut self, outcome: Outcome, at: DateTime<Utc>) {
        match outcome {
            Outcome::Win => self.wins = self.wins.saturating_add(1),
            Outcome::Loss => self.losses = self.losses.saturating_add(1),
            Outcome::Draw => self.draws = self.draws.saturating_add(1),
        }
        self.last_played = Some(at);
    }

    pub fn games_played(&self) -> u64 {
        u64::from(self.wins) + u64::from(self.losses) + u64::from(self.draws)
    }
}

impl GameSave for TicTacToeSave {
    const GAME: GameId = GameId::TicTacToe;
    const VERSION: u32 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    #[test]
    fn test_slugs_round_trip_and_are_valid_namespaces() {
        for game in GameId::ALL {
            assert_eq!(game.slug().parse::<GameId>().unwrap(), game);
            assert!(game.namespace().is_ok());
        }
        assert!("chess".parse::<GameId>().is_err());
    }

    #[test]
    fn test_schema_version_matches_record() {
        assert_eq!(GameId::TicTacToe.schema_version(), TicTacToeSave::VERSION);
        assert_eq!(GameId::NumberTouch.schema_version(), NumberTouchSave::VERSION);
    }

    #[test]
    fn test_slot_load_save_reset() {
        let backend = Arc::new(MemoryBackend::new());
        let slot: GameSlot<_, TicTacToeSave> = GameSlot::open(Arc::clone(&backend)).unwrap();
        assert_eq!(slot.load(), TicTacToeSave::default());

        let now = Utc::now();
        let saved = slot.update(|save| save.record(Outcome::Win, now));
        assert_eq!(slot.load(), saved);
        assert_eq!(slot.load().games_played(), 1);

        assert!(slot.reset());
        assert_eq!(slot.load(), TicTacToeSave::default());
    }

    #[test]
    fn test_slot_discards_other_version() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_item("tic-tac-toe@version", "0").unwrap();
        backend
            .set_item("tic-tac-toe:save", r#"{"wins":9}"#)
            .unwrap();

        let slot: GameSlot<_, TicTacToeSave> = GameSlot::open(Arc::clone(&backend)).unwrap();
        assert_eq!(slot.load().wins, 0);
        assert_eq!(
            backend.get_item("tic-tac-toe@version").unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_tally_at_limit_saturates() {
        let backend = Arc::new(MemoryBackend::new());
        let slot: GameSlot<_, TicTacToeSave> = GameSlot::open(Arc::clone(&backend)).unwrap();
        backend
            .set_item("tic-tac-toe:save", r#"{"wins":4294967295,"losses":1}"#)
            .unwrap();

        let loaded = slot.load();
        assert_eq!(loaded.wins, u32::MAX);
        assert_eq!(loaded.games_played(), u64::from(u32::MAX) + 1);

        let saved = slot.update(|save| save.record(Outcome::Win, Utc::now()));
        assert_eq!(saved.wins, u32::MAX);
        assert_eq!(saved.games_played(), u64::from(u32::MAX) + 1);
        assert_eq!(slot.load(), saved);
    }

    #[test]
    fn test_memory_best_prefers_fewer_moves_then_time() {
        let mut save = MemoryCardsSave::default();
        assert!(save.record("4x4", MemoryBest { moves: 20, seconds: 60 }));
        assert!(!save.record("4x4", MemoryBest { moves: 22, seconds: 30 }));
        assert!(save.record("4x4", MemoryBest { moves: 20, seconds: 50 }));
        assert_eq!(save.best["4x4"].seconds, 50);
    }

    #[test]
    fn test_color_shelf_drops_oldest() {
        let mut save = ColorMixerSave::default();
        for i in 0..(ColorMixerSave::MAX_SAVED + 2) {
            save.keep(SavedMix {
                ingredients: vec!["#ff0000".to_string()],
                result: format!("#{:06x}", i),
            });
        }
        assert_eq!(save.saved_mixes.len(), ColorMixerSave::MAX_SAVED);
        assert_eq!(save.saved_mixes[0].result, "#000002");
    }

    #[test]
    fn test_melody_upsert_replaces_by_name() {
        let mut save = MelodyMakerSave::default();
        let tune = |tempo| Melody {
            name: "twinkle".to_string(),
            notes: vec!["C4".to_string(), "C4".to_string(), "G4".to_string()],
            tempo,
        };
        save.upsert(tune(90));
        save.upsert(tune(120));
        assert_eq!(save.melodies.len(), 1);
        assert_eq!(save.melodies[0].tempo, 120);
    }

    #[test]
    fn test_number_touch_keeps_fastest() {
        let mut save = NumberTouchSave::default();
        let now = Utc::now();
        assert!(save.record(1, 9_000, now));
        assert!(!save.record(1, 9_500, now));
        assert!(save.record(1, 8_000, now));
        assert_eq!(save.best_times[&1].millis, 8_000);
    }

    #[test]
    fn test_number_touch_round_trips_through_store() {
        let backend = Arc::new(MemoryBackend::new());
        let slot: GameSlot<_, NumberTouchSave> = GameSlot::open(backend).unwrap();
        let saved = slot.update(|save| {
            save.record(3, 12_345, Utc::now());
        });
        assert_eq!(slot.load(), saved);
    }
}
