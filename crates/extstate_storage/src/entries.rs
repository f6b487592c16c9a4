//! Shared entry map used by every store implementation.

use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Entries of a store, with quota enforcement and a closed flag.
#[derive(Debug)]
pub(crate) struct EntryMap {
    map: RwLock<BTreeMap<String, Value>>,
    quota_bytes: Option<usize>,
    closed: AtomicBool,
}

impl EntryMap {
    pub(crate) fn new(map: BTreeMap<String, Value>, quota_bytes: Option<usize>) -> Self {
        Self {
            map: RwLock::new(map),
            quota_bytes,
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    pub(crate) fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        self.ensure_open()?;
        Ok(self.map.read().get(key).cloned())
    }

    /// Inserts a value, returning the previous one.
    ///
    /// The insert is undone if the resulting map exceeds the quota.
    pub(crate) fn insert(&self, key: &str, value: Value) -> StorageResult<Option<Value>> {
        self.ensure_open()?;
        let mut map = self.map.write();
        let previous = map.insert(key.to_string(), value);

        if let Some(quota) = self.quota_bytes {
            let needed = serde_json::to_vec(&*map)?.len();
            if needed > quota {
                restore_locked(&mut map, key, previous);
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        Ok(previous)
    }

    /// Removes a key, returning the previous value.
    pub(crate) fn remove(&self, key: &str) -> StorageResult<Option<Value>> {
        self.ensure_open()?;
        Ok(self.map.write().remove(key))
    }

    /// Puts `previous` back under `key`, undoing a failed mutation.
    pub(crate) fn restore(&self, key: &str, previous: Option<Value>) {
        restore_locked(&mut self.map.write(), key, previous);
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.map.read().contains_key(key)
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<String, Value> {
        self.map.read().clone()
    }

    pub(crate) fn to_json_bytes(&self) -> StorageResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&*self.map.read())?)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.read().len()
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

fn restore_locked(map: &mut BTreeMap<String, Value>, key: &str, previous: Option<Value>) {
    match previous {
        Some(value) => {
            map.insert(key.to_string(), value);
        }
        None => {
            map.remove(key);
        }
    }
}
