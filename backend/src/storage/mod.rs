//! Key-value storage module
//!
//! A small storage abstraction in the spirit of a "use storage(namespace)" handle:
//! drivers implement [`KvStorage`] and callers bind one namespace through [`Namespace`].
//! Values are JSON documents.

pub mod error;
pub mod memory;
pub mod sqlite;

pub use error::StorageError;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A namespaced key-value store holding JSON values
///
/// Implementations must be safe for concurrent reads; handlers share one
/// instance across every request.
#[async_trait]
pub trait KvStorage: Send + Sync {
    /// List every key stored under `namespace`
    async fn list_keys(&self, namespace: &str) -> Result<Vec<String>, StorageError>;

    /// Fetch the value stored under `namespace`/`key`, if any
    async fn get_item(&self, namespace: &str, key: &str) -> Result<Option<Value>, StorageError>;

    /// Store `value` under `namespace`/`key`, replacing any previous value
    async fn set_item(&self, namespace: &str, key: &str, value: Value)
        -> Result<(), StorageError>;

    /// Remove `namespace`/`key`, returning whether a value was present
    async fn remove_item(&self, namespace: &str, key: &str) -> Result<bool, StorageError>;
}

/// A storage handle bound to a single namespace
#[derive(Clone)]
pub struct Namespace {
    storage: Arc<dyn KvStorage>,
    name: String,
}

impl Namespace {
    /// Bind `storage` to the namespace `name`
    pub fn new(storage: Arc<dyn KvStorage>, name: impl Into<String>) -> Self {
        Self {
            storage,
            name: name.into(),
        }
    }

    /// List every key in this namespace
    pub async fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.storage.list_keys(&self.name).await
    }

    /// Fetch the value stored under `key`
    pub async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.storage.get_item(&self.name, key).await
    }

    /// Store `value` under `key`
    pub async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.storage.set_item(&self.name, key, value).await
    }

    /// Remove `key`, returning whether it existed
    pub async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.storage.remove_item(&self.name, key).await
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace").field("name", &self.name).finish()
    }
}
