//! # Playbox Core
//!
//! Core library for Playbox - the persistence layer shared by the Playbox
//! mini-games (color mixer, memory cards, melody maker, number touch,
//! tic-tac-toe).
//!
//! This crate provides the namespaced key/value store every game uses for its
//! settings and saved state, independent of any UI.
//!
//! ## Architecture
//!
//! - **storage**: Backend traits, backends, the namespaced store and change notification
//! - **settings**: Language/sound settings as an explicit value
//! - **games**: Game identifiers and per-game save records
//!
//! Every read and write through the store fails open: reads degrade to the
//! caller's default and writes report `false` instead of erroring.

pub mod error;
pub mod fs;
pub mod games;
pub mod settings;
pub mod storage;

pub use error::{Result, StoreError};
pub use storage::{AsyncKeyValueStore, AsyncStorageBackend, KeyValueStore, StorageBackend};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
