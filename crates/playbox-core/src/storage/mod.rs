//! Storage layer: backends and the namespaced stores built on them.

pub mod async_store;
pub mod indexed;
pub mod memory;
pub mod notify;
pub mod sqlite;
pub mod store;
pub mod traits;
pub mod types;

pub use async_store::AsyncKeyValueStore;
pub use indexed::IndexedBackend;
pub use memory::MemoryBackend;
pub use notify::{ChangeBus, Listener, Subscription};
pub use sqlite::SqliteBackend;
pub use store::KeyValueStore;
pub use traits::{AsyncStorageBackend, StorageBackend};
pub use types::{Change, Namespace, VersionCheck};
