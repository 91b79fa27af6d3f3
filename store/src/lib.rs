//! Persistent storage for the wallet core.
//!
//! The wallet persists a handful of JSON documents under fixed string keys.
//! Backends only need last-write-wins `get`/`set`; the wallet layer is
//! responsible for serialising read-modify-write sequences.

pub mod error;
pub mod file;
pub mod keys;
pub mod memory;

pub use error::StoreError;
pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Async string-keyed document store.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read one entry; `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write several entries at once. Each key overwrites its previous value.
    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError>;

    /// Remove every entry.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Read and deserialize one entry.
pub async fn load<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match storage.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("{key}: {e}"))),
        None => Ok(None),
    }
}

/// Serialize and write one entry.
pub async fn save<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value)
        .map_err(|e| StoreError::Serialization(format!("{key}: {e}")))?;
    let mut entries = Map::new();
    entries.insert(key.to_string(), value);
    storage.set(entries).await
}
