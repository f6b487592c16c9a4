//! Store configuration.

/// Default quota, matching the extension `storage.local` area.
pub const DEFAULT_QUOTA_BYTES: usize = 10 * 1024 * 1024;

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum serialized size of all entries (`None` = unlimited).
    pub quota_bytes: Option<usize>,

    /// Whether file-backed stores fsync after every write (safer but slower).
    pub sync_on_write: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            sync_on_write: true,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quota in bytes.
    #[must_use]
    pub const fn quota_bytes(mut self, quota: usize) -> Self {
        self.quota_bytes = Some(quota);
        self
    }

    /// Removes the quota.
    #[must_use]
    pub const fn unlimited(mut self) -> Self {
        self.quota_bytes = None;
        self
    }

    /// Sets whether to fsync after every write.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}
