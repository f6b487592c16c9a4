//! Key-value store trait definition.

use crate::change_feed::{Listener, StorageChange, Subscription};
use crate::error::StorageResult;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

/// A persistent, observable key-value store.
///
/// Stores map string keys to JSON values. They do not interpret the values
/// they hold; typed access belongs to the layer above.
///
/// # Invariants
///
/// - `get` returns exactly the value most recently `set` for the key, or
///   `None` if the key was never set or has been removed
/// - every `set`, and every `remove` of a present key, emits exactly one
///   [`StorageChange`] after the mutation is applied
/// - handles that share state also share change notifications
/// - stores must be `Send + Sync` so that handles can be shared across tasks
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and ephemeral state
/// - [`super::FileStore`] - For state that survives restarts
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or cannot be read.
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The store is closed
    /// - The write would exceed the store quota
    /// - The write cannot be persisted
    async fn set(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the removal cannot be
    /// persisted.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Subscribes to changes through a channel.
    fn subscribe_changes(&self) -> UnboundedReceiver<StorageChange>;

    /// Registers a callback invoked for every change.
    fn listen(&self, listener: Listener) -> Subscription;
}
