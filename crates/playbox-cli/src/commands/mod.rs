//! Command handlers.

mod entries;
mod games;
mod init;
mod misc;
mod settings;

pub use entries::{handle_clear, handle_dump, handle_get, handle_keys, handle_remove, handle_set};
pub use games::{handle_games, handle_reset};
pub use init::handle_init;
pub use misc::handle_completions;
pub use settings::handle_settings;
