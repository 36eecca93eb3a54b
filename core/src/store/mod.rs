//! Persisted session storage.
//!
//! RULE: Only the store talks to the backing medium.
//! The session context calls store methods with the well-known keys
//! from `types` and never touches SQL or maps directly.
//!
//! Two backends exist:
//!   - `MemoryStore`: session-scoped, gone when the process exits.
//!   - `SqliteStore`: durable, survives restarts.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::{
    config::StorageBackend,
    error::DeskResult,
};

/// String-keyed, string-valued storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> DeskResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> DeskResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> DeskResult<()>;
}

/// Open the backend named in configuration.
pub fn open_backend(backend: &StorageBackend) -> DeskResult<Box<dyn KeyValueStore>> {
    match backend {
        StorageBackend::Session => Ok(Box::new(MemoryStore::new())),
        StorageBackend::Durable { path } => {
            let store = SqliteStore::open(path)?;
            store.migrate()?;
            Ok(Box::new(store))
        }
    }
}
