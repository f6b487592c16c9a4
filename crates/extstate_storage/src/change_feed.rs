//! Change feed for observing store mutations.
//!
//! Every applied `set` or `remove` produces one [`StorageChange`] that is
//! delivered to two kinds of observers:
//! - channel subscribers, created with [`ChangeFeed::subscribe`]
//! - callback listeners, registered with [`ChangeFeed::listen`]
//!
//! Store handles that share state also share their feed, so a mutation made
//! through one handle is observed by listeners registered through another.
//!
//! # Usage
//!
//! ```rust
//! use extstate_storage::{ChangeFeed, StorageChange};
//! use serde_json::json;
//!
//! let feed = ChangeFeed::new();
//! let mut rx = feed.subscribe();
//!
//! feed.emit(StorageChange::new("userConsent", None, Some(json!(true))));
//!
//! let change = rx.try_recv().unwrap();
//! assert_eq!(change.key, "userConsent");
//! ```

use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A single mutation of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    /// The key that changed.
    pub key: String,
    /// Value before the mutation. `None` if the key was absent.
    pub old_value: Option<Value>,
    /// Value after the mutation. `None` if the key was removed.
    pub new_value: Option<Value>,
}

impl StorageChange {
    /// Creates a change event.
    pub fn new(key: impl Into<String>, old_value: Option<Value>, new_value: Option<Value>) -> Self {
        Self {
            key: key.into(),
            old_value,
            new_value,
        }
    }

    /// Returns true if this change removed the key.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

/// Callback invoked for every change.
pub type Listener = Arc<dyn Fn(&StorageChange) + Send + Sync>;

type ListenerList = RwLock<Vec<(u64, Listener)>>;

/// Handle to a registered listener.
///
/// Dropping the handle leaves the listener attached; call
/// [`Subscription::unsubscribe`] to detach it.
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerList>,
}

impl Subscription {
    /// Returns the listener id, unique within its feed.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Detaches the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut listeners = listeners.write();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != self.id);
        listeners.len() != before
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Distributes store mutations to subscribers and listeners.
///
/// The feed:
/// - Emits only applied mutations, in the order they were applied
/// - Supports any number of subscribers and listeners
/// - Never holds its own locks while a listener runs
pub struct ChangeFeed {
    subscribers: RwLock<Vec<UnboundedSender<StorageChange>>>,
    listeners: Arc<ListenerList>,
    next_listener_id: AtomicU64,
}

impl ChangeFeed {
    /// Creates an empty change feed.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_listener_id: AtomicU64::new(1),
        }
    }

    /// Subscribes to the feed.
    ///
    /// Returns a receiver that gets every future change. Dropping the
    /// receiver unsubscribes on the next emit.
    pub fn subscribe(&self) -> UnboundedReceiver<StorageChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Registers a callback invoked synchronously for every future change.
    pub fn listen(&self, listener: Listener) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().push((id, listener));
        tracing::debug!(listener_id = id, "change listener registered");
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Emits a change to all subscribers and listeners.
    pub fn emit(&self, change: StorageChange) {
        self.subscribers
            .write()
            .retain(|tx| tx.send(change.clone()).is_ok());

        // Snapshot so a listener may register or unsubscribe re-entrantly.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&change);
        }
    }

    /// Returns the number of live channel subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns the number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("subscribers", &self.subscriber_count())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
