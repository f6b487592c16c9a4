//! # extstate Core
//!
//! Typed accessor for the session and user state of a browser extension.
//!
//! This crate provides:
//! - [`SessionStore`], which maps each logical field to one reserved key
//! - The stored record types ([`UserMetadata`], [`LoginState`])
//! - Login expiry: a login record is trusted for one hour after it is
//!   written and removed by the first read after that
//! - A [`Clock`] seam so expiry can be tested without waiting
//!
//! The store itself is injected; see [`extstate_storage::KvStore`].
//!
//! ## Example
//!
//! ```rust
//! use extstate_core::SessionStore;
//! use extstate_storage::InMemoryStore;
//! use std::sync::Arc;
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let session = SessionStore::new(Arc::new(InMemoryStore::new()));
//!
//!     assert!(!session.get_consent().await.unwrap());
//!     session.set_logged_in(true).await.unwrap();
//!     assert_eq!(session.get_logged_in().await.unwrap(), Some(true));
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
mod config;
mod error;
mod model;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{keys, Config, StoreKeys, LOGIN_TTL};
pub use error::{CoreError, CoreResult};
pub use model::{LoginState, LoginValidity, SessionSnapshot, UserMetadata};
pub use session::SessionStore;

pub use extstate_storage::Subscription;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
