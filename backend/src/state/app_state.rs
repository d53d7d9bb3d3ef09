// Application state
// Holds the chat store and listing settings shared by all handlers

use crate::chat::ChatStore;
use crate::config::{Config, StorageDriver};
use crate::storage::{KvStorage, MemoryStorage, SqliteStorage, StorageError};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::info;

/// Main application state
///
/// Cheap to clone; every clone shares the same storage.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Stored chats
    pub chats: ChatStore,
    /// Maximum concurrent title lookups while listing, `None` for unbounded
    pub list_concurrency: Option<NonZeroUsize>,
}

impl AppState {
    /// Build state around an existing storage driver
    pub fn new(storage: Arc<dyn KvStorage>) -> Self {
        Self {
            chats: ChatStore::new(storage),
            list_concurrency: None,
        }
    }

    /// Set the listing concurrency limit
    pub fn with_list_concurrency(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.list_concurrency = limit;
        self
    }

    /// Open the configured storage driver and build state around it
    pub async fn from_config(config: &Config) -> Result<Self, StorageError> {
        let storage: Arc<dyn KvStorage> = match config.storage.driver {
            StorageDriver::Memory => {
                info!("Using in-memory chat storage");
                Arc::new(MemoryStorage::new())
            }
            StorageDriver::Sqlite => {
                Arc::new(SqliteStorage::new(&config.storage.db_path()).await?)
            }
        };

        Ok(Self::new(storage).with_list_concurrency(config.listing.limit()))
    }
}
