//! In-memory storage

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use super::Storage;
use crate::core::StorageError;

/// In-memory implementation of [`Storage`]
///
/// Clones share the same map, so a host and its tests can observe the same
/// entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<DashMap<String, Value>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| entry.key().strip_prefix(prefix).map(str::to_string))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{get_json, put_json};
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_storage_basic() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.put("role/a", json!({"k": 1})).await.unwrap();
        assert_eq!(storage.get("role/a").await.unwrap(), Some(json!({"k": 1})));
        assert_eq!(storage.len(), 1);

        storage.delete("role/a").await.unwrap();
        assert!(storage.get("role/a").await.unwrap().is_none());

        // deleting again is fine
        storage.delete("role/a").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_strips_prefix_and_sorts() {
        let storage = MemoryStorage::new();
        storage.put("role/b", json!(1)).await.unwrap();
        storage.put("role/a", json!(2)).await.unwrap();
        storage.put("config/root", json!(3)).await.unwrap();

        let keys = storage.list("role/").await.unwrap();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.put("k", json!(true)).await.unwrap();
        assert_eq!(other.get("k").await.unwrap(), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_reported() {
        let storage = MemoryStorage::new();
        storage.put("k", json!("not a number")).await.unwrap();

        let result = get_json::<u64>(&storage, "k").await;
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));

        put_json(&storage, "n", &7_u64).await.unwrap();
        assert_eq!(get_json::<u64>(&storage, "n").await.unwrap(), Some(7));
    }
}
