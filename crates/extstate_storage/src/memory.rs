//! In-memory store for testing.

use crate::backend::KvStore;
use crate::change_feed::{ChangeFeed, Listener, StorageChange, Subscription};
use crate::config::StoreConfig;
use crate::entries::EntryMap;
use crate::error::StorageResult;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// An in-memory key-value store.
///
/// This store keeps all entries in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral state that doesn't need persistence
///
/// # Shared Handles
///
/// Cloning an `InMemoryStore` yields another handle to the same entries and
/// the same change feed, the way separate pages of one extension see the
/// same storage area.
///
/// # Example
///
/// ```rust
/// use extstate_storage::{InMemoryStore, KvStore};
/// use serde_json::json;
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// rt.block_on(async {
///     let store = InMemoryStore::new();
///     store.set("userConsent", json!(true)).await.unwrap();
///     assert_eq!(store.get("userConsent").await.unwrap(), Some(json!(true)));
/// });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    entries: EntryMap,
    feed: ChangeFeed,
}

impl InMemoryStore {
    /// Creates a new empty store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a new empty store with the given configuration.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_entries(config, BTreeMap::new())
    }

    /// Creates a store with pre-existing entries.
    ///
    /// Useful for testing how readers handle stored data.
    #[must_use]
    pub fn with_entries(config: StoreConfig, entries: BTreeMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(Shared {
                entries: EntryMap::new(entries, config.quota_bytes),
                feed: ChangeFeed::new(),
            }),
        }
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, Value> {
        self.inner.entries.snapshot()
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.entries.contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Returns true if the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes the store for every handle. Later operations fail.
    pub fn close(&self) {
        self.inner.entries.close();
    }

    /// Returns true if the store has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.entries.is_closed()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        self.inner.entries.get(key)
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let previous = self.inner.entries.insert(key, value.clone())?;
        self.inner
            .feed
            .emit(StorageChange::new(key, previous, Some(value)));
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        if let Some(previous) = self.inner.entries.remove(key)? {
            self.inner
                .feed
                .emit(StorageChange::new(key, Some(previous), None));
        }
        Ok(())
    }

    fn subscribe_changes(&self) -> UnboundedReceiver<StorageChange> {
        self.inner.feed.subscribe()
    }

    fn listen(&self, listener: Listener) -> Subscription {
        self.inner.feed.listen(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use serde_json::json;

    #[tokio::test]
    async fn memory_new_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_set_then_get() {
        let store = InMemoryStore::new();
        store
            .set("userMetadata", json!({"id": "u1", "cities": ["Paris"]}))
            .await
            .unwrap();

        let value = store.get("userMetadata").await.unwrap().unwrap();
        assert_eq!(value["cities"][0], "Paris");
    }

    #[tokio::test]
    async fn memory_set_overwrites() {
        let store = InMemoryStore::new();
        store.set("userConsent", json!(false)).await.unwrap();
        store.set("userConsent", json!(true)).await.unwrap();
        assert_eq!(store.get("userConsent").await.unwrap(), Some(json!(true)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn memory_remove() {
        let store = InMemoryStore::new();
        store.set("userId", json!("abc")).await.unwrap();
        store.remove("userId").await.unwrap();
        assert!(!store.contains_key("userId"));

        // Removing again is fine.
        store.remove("userId").await.unwrap();
    }

    #[tokio::test]
    async fn memory_emits_changes() {
        let store = InMemoryStore::new();
        let mut rx = store.subscribe_changes();

        store.set("userSearching", json!(true)).await.unwrap();
        store.set("userSearching", json!(false)).await.unwrap();
        store.remove("userSearching").await.unwrap();
        store.remove("userSearching").await.unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.old_value, None);
        assert_eq!(first.new_value, Some(json!(true)));

        let second = rx.try_recv().unwrap();
        assert_eq!(second.old_value, Some(json!(true)));
        assert_eq!(second.new_value, Some(json!(false)));

        let third = rx.try_recv().unwrap();
        assert!(third.is_removal());

        // Removing an absent key emits nothing.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn memory_clones_share_state_and_feed() {
        let store = InMemoryStore::new();
        let other = store.clone();
        let mut rx = store.subscribe_changes();

        other.set("userConsent", json!(true)).await.unwrap();

        assert_eq!(store.get("userConsent").await.unwrap(), Some(json!(true)));
        assert_eq!(rx.try_recv().unwrap().key, "userConsent");
    }

    #[tokio::test]
    async fn memory_quota_exceeded() {
        let store = InMemoryStore::with_config(StoreConfig::new().quota_bytes(16));
        let mut rx = store.subscribe_changes();

        let result = store.set("userId", json!("x".repeat(32))).await;
        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));
        assert!(store.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn memory_closed_fails() {
        let store = InMemoryStore::new();
        store.clone().close();
        assert!(store.is_closed());
        assert!(matches!(
            store.set("userConsent", json!(true)).await,
            Err(StorageError::Closed)
        ));
    }

    #[tokio::test]
    async fn memory_with_entries() {
        let mut entries = BTreeMap::new();
        entries.insert("userId".to_string(), json!("preloaded"));
        let store = InMemoryStore::with_entries(StoreConfig::default(), entries);
        assert_eq!(store.get("userId").await.unwrap(), Some(json!("preloaded")));
    }
}
