//! Chat listing
//!
//! Enumerates the `chats` namespace and resolves every id to its title.
//! Title lookups run concurrently; results are assembled in id order, never in
//! completion order.

use crate::chat::store::ChatStore;
use crate::storage::StorageError;
use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::num::NonZeroUsize;
use tracing::{debug, warn};

/// All stored chat ids paired positionally with their titles
///
/// `titles[i]` belongs to `ids[i]`; both vectors always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatListing {
    /// Chat ids, in storage enumeration order
    pub ids: Vec<String>,
    /// Title of each chat, `None` when untitled, deleted, or unreadable
    pub titles: Vec<Option<String>>,
}

/// List every chat with its title
///
/// Failing to enumerate the namespace fails the whole listing. A failing or
/// empty lookup for a single chat only blanks that chat's title.
///
/// # Arguments
/// * `store` - Chat store to read from
/// * `concurrency` - Maximum in-flight title lookups, `None` for all at once
pub async fn list_chats(
    store: &ChatStore,
    concurrency: Option<NonZeroUsize>,
) -> Result<ChatListing, StorageError> {
    let ids = store.ids().await?;

    // Each lookup owns its store handle and id so the joined future stays `Send`
    let lookups: Vec<_> = ids
        .iter()
        .map(|id| resolve_title(store.clone(), id.clone()))
        .collect();
    let titles: Vec<Option<String>> = match concurrency {
        Some(limit) => stream::iter(lookups).buffered(limit.get()).collect().await,
        None => join_all(lookups).await,
    };

    debug!(count = ids.len(), "Listed chats");
    Ok(ChatListing { ids, titles })
}

async fn resolve_title(store: ChatStore, id: String) -> Option<String> {
    match store.title(&id).await {
        Ok(title) => title,
        Err(e) => {
            warn!(
                chat_id = %id,
                error = %e,
                "Failed to read chat, listing it without a title"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::CHATS_NAMESPACE;
    use crate::storage::{KvStorage, MemoryStorage};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    /// Wraps a memory store, delaying reads of earlier keys the longest so
    /// lookups complete in reverse order
    struct SlowFirstStorage {
        inner: MemoryStorage,
        order: Vec<String>,
    }

    #[async_trait]
    impl KvStorage for SlowFirstStorage {
        async fn list_keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
            self.inner.list_keys(namespace).await
        }

        async fn get_item(
            &self,
            namespace: &str,
            key: &str,
        ) -> Result<Option<Value>, StorageError> {
            let position = self.order.iter().position(|k| k == key).unwrap_or(0);
            let delay = (self.order.len() - position) as u64 * 20;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.inner.get_item(namespace, key).await
        }

        async fn set_item(
            &self,
            namespace: &str,
            key: &str,
            value: Value,
        ) -> Result<(), StorageError> {
            self.inner.set_item(namespace, key, value).await
        }

        async fn remove_item(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
            self.inner.remove_item(namespace, key).await
        }
    }

    /// Enumerates fine but fails to read the listed keys
    struct FlakyStorage {
        keys: Vec<String>,
        broken: Vec<String>,
        inner: MemoryStorage,
    }

    #[async_trait]
    impl KvStorage for FlakyStorage {
        async fn list_keys(&self, _namespace: &str) -> Result<Vec<String>, StorageError> {
            Ok(self.keys.clone())
        }

        async fn get_item(
            &self,
            namespace: &str,
            key: &str,
        ) -> Result<Option<Value>, StorageError> {
            if self.broken.iter().any(|k| k == key) {
                return Err(StorageError::Unavailable("read timed out".to_string()));
            }
            self.inner.get_item(namespace, key).await
        }

        async fn set_item(
            &self,
            namespace: &str,
            key: &str,
            value: Value,
        ) -> Result<(), StorageError> {
            self.inner.set_item(namespace, key, value).await
        }

        async fn remove_item(&self, namespace: &str, key: &str) -> Result<bool, StorageError> {
            self.inner.remove_item(namespace, key).await
        }
    }

    /// Cannot enumerate at all
    struct DownStorage;

    #[async_trait]
    impl KvStorage for DownStorage {
        async fn list_keys(&self, _namespace: &str) -> Result<Vec<String>, StorageError> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn get_item(
            &self,
            _namespace: &str,
            _key: &str,
        ) -> Result<Option<Value>, StorageError> {
            panic!("get_item must not be called when enumeration fails");
        }

        async fn set_item(
            &self,
            _namespace: &str,
            _key: &str,
            _value: Value,
        ) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn remove_item(&self, _namespace: &str, _key: &str) -> Result<bool, StorageError> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }
    }

    async fn seeded_memory() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage
            .set_item(CHATS_NAMESPACE, "a", json!({"title": "X"}))
            .await
            .unwrap();
        storage
            .set_item(CHATS_NAMESPACE, "b", json!({}))
            .await
            .unwrap();
        storage
            .set_item(CHATS_NAMESPACE, "c", json!({"title": "Z"}))
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn test_list_chats_empty() {
        let store = ChatStore::new(Arc::new(MemoryStorage::new()));
        let listing = list_chats(&store, None).await.unwrap();
        assert!(listing.ids.is_empty());
        assert_eq!(listing, ChatListing::default());
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn test_list_chats_future_is_send() {
        let store = ChatStore::new(Arc::new(MemoryStorage::new()));
        assert_send(list_chats(&store, None));
        assert_send(list_chats(&store, NonZeroUsize::new(2)));
    }

    #[tokio::test]
    async fn test_list_chats_aligns_titles() {
        let store = ChatStore::new(Arc::new(seeded_memory().await));
        let listing = list_chats(&store, None).await.unwrap();

        assert_eq!(listing.ids, vec!["a", "b", "c"]);
        assert_eq!(
            listing.titles,
            vec![Some("X".to_string()), None, Some("Z".to_string())]
        );
    }

    #[tokio::test]
    async fn test_list_chats_preserves_order_when_lookups_finish_out_of_order() {
        let storage = SlowFirstStorage {
            inner: seeded_memory().await,
            order: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };
        let store = ChatStore::new(Arc::new(storage));

        let listing = list_chats(&store, None).await.unwrap();
        assert_eq!(listing.ids, vec!["a", "b", "c"]);
        assert_eq!(
            listing.titles,
            vec![Some("X".to_string()), None, Some("Z".to_string())]
        );
    }

    #[tokio::test]
    async fn test_bounded_concurrency_matches_unbounded() {
        let storage = SlowFirstStorage {
            inner: seeded_memory().await,
            order: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };
        let store = ChatStore::new(Arc::new(storage));

        let unbounded = list_chats(&store, None).await.unwrap();
        for limit in [1, 2, 8] {
            let bounded = list_chats(&store, NonZeroUsize::new(limit)).await.unwrap();
            assert_eq!(bounded, unbounded, "limit {}", limit);
        }
    }

    #[tokio::test]
    async fn test_unreadable_and_vanished_chats_keep_their_ids() {
        let inner = MemoryStorage::new();
        inner
            .set_item(CHATS_NAMESPACE, "ok", json!({"title": "Fine"}))
            .await
            .unwrap();
        let storage = FlakyStorage {
            keys: vec!["ok".to_string(), "broken".to_string(), "gone".to_string()],
            broken: vec!["broken".to_string()],
            inner,
        };
        let store = ChatStore::new(Arc::new(storage));

        let listing = list_chats(&store, None).await.unwrap();
        assert_eq!(listing.ids, vec!["ok", "broken", "gone"]);
        assert_eq!(listing.titles, vec![Some("Fine".to_string()), None, None]);
    }

    #[tokio::test]
    async fn test_enumeration_failure_fails_listing() {
        let store = ChatStore::new(Arc::new(DownStorage));
        let result = list_chats(&store, None).await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_list_chats_is_idempotent() {
        let store = ChatStore::new(Arc::new(seeded_memory().await));
        let first = list_chats(&store, None).await.unwrap();
        let second = list_chats(&store, None).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_listing_serializes_null_titles() {
        let listing = ChatListing {
            ids: vec!["a".to_string(), "b".to_string()],
            titles: vec![Some("X".to_string()), None],
        };
        assert_eq!(
            serde_json::to_value(&listing).unwrap(),
            json!({"ids": ["a", "b"], "titles": ["X", null]})
        );
    }
}
