//! Persistence layer for the plugin license service.
//!
//! - [`KeyValueStore`]: the host's key-value persistence, with in-memory and
//!   SQLite backends
//! - [`LicenseRecordStore`]: the encrypted storage map plus individually
//!   stored license ids and activation keys

mod error;
mod kv;
mod record;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use kv::{KeyValueStore, MemoryStore};
pub use record::{DEFAULT_STORAGE_MAP_KEY, LicenseRecordStore};
pub use sqlite::SqliteStore;
