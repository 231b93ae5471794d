//! Key-value persistence injected into the companion client.
//!
//! Settings are plain string pairs. [`JsonFileStore`] keeps them in a JSON
//! object file; [`MemoryStore`] keeps them for the life of the process.

pub mod error;
pub mod file;
pub mod memory;
pub mod paths;

pub use error::StoreError;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use paths::{config_dir, default_store_path};

/// String key-value persistence.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Every stored key, sorted.
    fn keys(&self) -> Vec<String>;
}
