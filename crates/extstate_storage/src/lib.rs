//! # extstate Storage
//!
//! Observable key-value store trait and implementations for extstate.
//!
//! This crate provides the storage substrate the session accessor sits on.
//! Stores are **untyped**: keys are strings, values are JSON, and the store
//! never interprets what it holds.
//!
//! ## Design Principles
//!
//! - Stores expose `get`, `set`, `remove` and change subscription
//! - Every applied mutation is reported as a [`StorageChange`]
//! - Handles are cheap to clone and share state and notifications
//! - Must be `Send + Sync` for use across tasks
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral state
//! - [`FileStore`] - For state persisted to a JSON document
//!
//! ## Example
//!
//! ```rust
//! use extstate_storage::{InMemoryStore, KvStore};
//! use serde_json::json;
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let store = InMemoryStore::new();
//!     let mut changes = store.subscribe_changes();
//!
//!     store.set("userId", json!("7f1c")).await.unwrap();
//!     assert_eq!(changes.try_recv().unwrap().key, "userId");
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod change_feed;
mod config;
mod entries;
mod error;
mod file;
mod memory;

pub use backend::KvStore;
pub use change_feed::{ChangeFeed, Listener, StorageChange, Subscription};
pub use config::{StoreConfig, DEFAULT_QUOTA_BYTES};
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
