//! File-based store for persistent state.

use crate::backend::KvStore;
use crate::change_feed::{ChangeFeed, Listener, StorageChange, Subscription};
use crate::config::StoreConfig;
use crate::entries::EntryMap;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use fs2::FileExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;

/// A file-based key-value store.
///
/// Entries live in memory and are written out as one JSON document after
/// every mutation. Data survives process restarts.
///
/// # Durability
///
/// - Each mutation rewrites a temporary file and renames it over the store
///   file, so a crash leaves either the old or the new document
/// - With [`StoreConfig::sync_on_write`], the temporary file is fsynced
///   before the rename
/// - A mutation that cannot be persisted is rolled back in memory and no
///   change is emitted
///
/// # Locking
///
/// Opening takes an exclusive advisory lock on a `<file>.lock` sidecar, held
/// until the last clone of the handle is dropped. A second `open` of the same
/// path fails with [`StorageError::Locked`]; share one store by cloning it.
///
/// # Example
///
/// ```no_run
/// use extstate_storage::{FileStore, KvStore, StoreConfig};
/// use serde_json::json;
/// use std::path::Path;
///
/// # async fn demo() -> extstate_storage::StorageResult<()> {
/// let store = FileStore::open(Path::new("state.json"), StoreConfig::default())?;
/// store.set("userConsent", json!(true)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    path: PathBuf,
    entries: EntryMap,
    feed: ChangeFeed,
    sync_on_write: bool,
    write_lock: Mutex<()>,
    _lock_file: File,
}

impl FileStore {
    /// Opens or creates a store at the given path.
    ///
    /// If the file exists, its entries are loaded. If it doesn't exist, an
    /// empty document is created.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another handle holds the lock (returns `Locked`)
    /// - The file cannot be read or created
    /// - The file does not contain a JSON object
    pub fn open(path: &Path, config: StoreConfig) -> StorageResult<Self> {
        let lock_path = sidecar_path(path, "lock");
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        // Non-blocking: a held lock means another handle owns this file.
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked(path.to_path_buf()));
        }

        let entries = if path.exists() {
            load(path)?
        } else {
            std::fs::write(path, b"{}")?;
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "opened file store");

        Ok(Self {
            inner: Arc::new(Shared {
                path: path.to_path_buf(),
                entries: EntryMap::new(entries, config.quota_bytes),
                feed: ChangeFeed::new(),
                sync_on_write: config.sync_on_write,
                write_lock: Mutex::new(()),
                _lock_file: lock_file,
            }),
        })
    }

    /// Opens or creates a store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the store cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path, config: StoreConfig) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path, config)
    }

    /// Returns the path to the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, Value> {
        self.inner.entries.snapshot()
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

    async fn persist(&self) -> StorageResult<()> {
        let bytes = self.inner.entries.to_json_bytes()?;
        let tmp_path = sidecar_path(&self.inner.path, "tmp");

        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        if self.inner.sync_on_write {
            file.sync_all().await?;
        }
        drop(file);

        tokio::fs::rename(&tmp_path, &self.inner.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        self.inner.entries.get(key)
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let guard = self.inner.write_lock.lock().await;
        let previous = self.inner.entries.insert(key, value.clone())?;
        if let Err(err) = self.persist().await {
            tracing::warn!(key, error = %err, "failed to persist write, rolling back");
            self.inner.entries.restore(key, previous);
            return Err(err);
        }
        drop(guard);

        self.inner
            .feed
            .emit(StorageChange::new(key, previous, Some(value)));
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let guard = self.inner.write_lock.lock().await;
        let Some(previous) = self.inner.entries.remove(key)? else {
            return Ok(());
        };
        if let Err(err) = self.persist().await {
            tracing::warn!(key, error = %err, "failed to persist removal, rolling back");
            self.inner.entries.restore(key, Some(previous));
            return Err(err);
        }
        drop(guard);

        self.inner
            .feed
            .emit(StorageChange::new(key, Some(previous), None));
        Ok(())
    }

    fn subscribe_changes(&self) -> UnboundedReceiver<StorageChange> {
        self.inner.feed.subscribe()
    }

    fn listen(&self, listener: Listener) -> Subscription {
        self.inner.feed.listen(listener)
    }
}

fn load(path: &Path) -> StorageResult<BTreeMap<String, Value>> {
    let bytes = std::fs::read(path)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(other) => Err(StorageError::Corrupted(format!(
            "expected a JSON object in {}, found {}",
            path.display(),
            json_kind(&other)
        ))),
        Err(err) => Err(StorageError::Corrupted(format!(
            "invalid JSON in {}: {err}",
            path.display()
        ))),
    }
}

fn sidecar_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
