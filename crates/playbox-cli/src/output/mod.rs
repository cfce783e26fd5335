//! Output formatting helpers for the CLI.
//!
//! Entries print either as a table for people or as JSON for scripts.

mod json;
mod text;

// Re-export public API
pub use json::entries_json;
pub use text::{entries_table, games_table};
