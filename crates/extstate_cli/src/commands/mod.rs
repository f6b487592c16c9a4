//! CLI command implementations.

pub mod flags;
pub mod inspect;
pub mod user;

use extstate_core::{Config, SessionStore};
use extstate_storage::{FileStore, StoreConfig};
use std::path::Path;
use std::sync::Arc;

/// Opens the session accessor over the store file at `path`.
pub fn open_session(
    path: &Path,
    prefix: Option<&str>,
) -> Result<SessionStore, Box<dyn std::error::Error>> {
    let store = FileStore::open_with_create_dirs(path, StoreConfig::default())?;
    let config = match prefix {
        Some(prefix) => Config::new().key_prefix(prefix),
        None => Config::new(),
    };
    Ok(SessionStore::with_config(Arc::new(store), &config))
}
