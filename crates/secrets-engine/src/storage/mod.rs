//! Durable key/value storage contract
//!
//! The host owns persistence; the engine only needs JSON entries under string
//! keys. [`MemoryStorage`] backs development hosts and tests.

mod memory;

pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::core::StorageError;

/// Host-provided durable storage
///
/// Implementations must offer read-your-writes consistency within one
/// backend; the engine adds no locking of its own.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load the entry stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Store `value` under `key`, replacing any previous entry
    async fn put(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Remove the entry under `key`; removing a missing key succeeds
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List keys starting with `prefix`, with the prefix stripped
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Load and decode a typed entry
pub(crate) async fn get_json<T>(storage: &dyn Storage, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
{
    match storage.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encode and store a typed entry
pub(crate) async fn put_json<T>(storage: &dyn Storage, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + Sync,
{
    let value = serde_json::to_value(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    storage.put(key, value).await
}
