//! Error types for store operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value or the store document could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The persisted store document is corrupted.
    #[error("store corrupted: {0}")]
    Corrupted(String),

    /// The write would grow the store past its quota.
    #[error("quota exceeded: write needs {needed} bytes, quota is {quota}")]
    QuotaExceeded {
        /// Serialized size the store would have after the write.
        needed: usize,
        /// Configured quota in bytes.
        quota: usize,
    },

    /// Another handle holds the lock on this store file.
    #[error("store locked: {0:?} is already open")]
    Locked(PathBuf),

    /// The store is closed.
    #[error("store is closed")]
    Closed,
}
