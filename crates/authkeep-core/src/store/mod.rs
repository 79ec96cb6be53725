//! Durable key-value storage for the persisted session.
//!
//! This module provides:
//! - `KeyValueStore`: the get/set/remove contract SessionManager persists through
//! - `FileStore`: one JSON file per key in a directory, survives restarts
//! - `MemoryStore`: process-local map, for embedding and tests
//!
//! Stores never expire entries on their own.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use anyhow::Result;

/// Scoped key to string persistence.
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value, `None` when the key was never set or was removed
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
