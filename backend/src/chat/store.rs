//! Chat storage operations
//!
//! A typed view of the `chats` namespace of a [`KvStorage`].

use crate::chat::models::{title_of, Chat};
use crate::storage::{KvStorage, Namespace, StorageError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Storage namespace holding chat records
pub const CHATS_NAMESPACE: &str = "chats";

/// Handle to the stored chats
///
/// Clones share one write lock, so read-modify-write updates through
/// [`ChatStore::update_chat`] never interleave.
#[derive(Clone, Debug)]
pub struct ChatStore {
    namespace: Namespace,
    writes: Arc<Mutex<()>>,
}

impl ChatStore {
    /// Bind a chat store to the `chats` namespace of `storage`
    pub fn new(storage: Arc<dyn KvStorage>) -> Self {
        Self {
            namespace: Namespace::new(storage, CHATS_NAMESPACE),
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// List the ids of every stored chat, in storage order
    pub async fn ids(&self) -> Result<Vec<String>, StorageError> {
        self.namespace.keys().await
    }

    /// Fetch only the title of a chat
    ///
    /// Returns `Ok(None)` both when the chat does not exist and when it has
    /// no title.
    pub async fn title(&self, id: &str) -> Result<Option<String>, StorageError> {
        let record = self.namespace.get(id).await?;
        Ok(record.as_ref().and_then(title_of))
    }

    /// Fetch and decode a full chat record
    pub async fn get_chat(&self, id: &str) -> Result<Option<Chat>, StorageError> {
        let Some(record) = self.namespace.get(id).await? else {
            return Ok(None);
        };

        let mut chat: Chat =
            serde_json::from_value(record).map_err(|e| StorageError::Corrupt {
                namespace: CHATS_NAMESPACE.to_string(),
                key: id.to_string(),
                reason: e.to_string(),
            })?;
        // The key is authoritative over whatever id the record carries
        chat.id = id.to_string();
        Ok(Some(chat))
    }

    /// Store a chat under its id
    pub async fn save_chat(&self, chat: &Chat) -> Result<(), StorageError> {
        let value = serde_json::to_value(chat)?;
        self.namespace.set(&chat.id, value).await?;
        debug!(chat_id = %chat.id, "Saved chat");
        Ok(())
    }

    /// Load a chat (or start a new one), apply `update`, and store the result
    ///
    /// A stored record that cannot be decoded as a chat is replaced by a new
    /// one. `updated_at` is refreshed; `created_at` is kept.
    pub async fn update_chat<F>(&self, id: &str, update: F) -> Result<Chat, StorageError>
    where
        F: FnOnce(&mut Chat),
    {
        let _guard = self.writes.lock().await;

        let mut chat = match self.get_chat(id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => Chat::new(id, None),
            Err(StorageError::Corrupt { reason, .. }) => {
                warn!(chat_id = %id, reason = %reason, "Replacing unreadable chat record");
                Chat::new(id, None)
            }
            Err(e) => return Err(e),
        };

        update(&mut chat);
        chat.id = id.to_string();
        chat.updated_at = chrono::Utc::now().timestamp();

        self.save_chat(&chat).await?;
        Ok(chat)
    }

    /// Delete a chat, returning whether it existed
    pub async fn delete_chat(&self, id: &str) -> Result<bool, StorageError> {
        let removed = self.namespace.remove(id).await?;
        debug!(chat_id = %id, removed, "Deleted chat");
        Ok(removed)
    }
}
