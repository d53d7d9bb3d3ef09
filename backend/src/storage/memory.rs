//! In-memory storage driver
//!
//! Keeps every namespace in a `BTreeMap`, so keys enumerate in sorted order.
//! Contents are lost when the process exits.

use super::{KvStorage, StorageError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Volatile key-value storage backed by a map
#[derive(Debug, Default)]
pub struct MemoryStorage {
    namespaces: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStorage for MemoryStorage {
    async fn list_keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .map(|items| items.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_item(&self, namespace: &str, key: &str) -> Result<Option<Value>, StorageError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .and_then(|items| items.get(key))
            .cloned())
    }

    async fn set_item(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
    ) -> Result<(), StorageError> {
        let mut namespaces = self.namespaces.write().await;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
        let mut namespaces = self.namespaces.write().await;
        Ok(namespaces
            .get_mut(namespace)
            .map(|items| items.remove(key).is_some())
            .unwrap_or(false))
    }
}
