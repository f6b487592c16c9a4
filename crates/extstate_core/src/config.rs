//! Accessor configuration and reserved keys.

use std::time::Duration;

/// How long a login record stays valid after `set_logged_in`.
pub const LOGIN_TTL: Duration = Duration::from_secs(60 * 60);

/// Base names of the reserved keys.
pub mod keys {
    /// Cached profile metadata.
    pub const USER_METADATA: &str = "userMetadata";
    /// Login state with expiry.
    pub const USER_LOGGED_IN: &str = "userLoggedIn";
    /// Consent flag.
    pub const USER_CONSENT: &str = "userConsent";
    /// Search-activity flag.
    pub const USER_SEARCHING: &str = "userSearching";
    /// Persistent user identifier.
    pub const USER_ID: &str = "userId";

    /// All reserved base names.
    pub const ALL: [&str; 5] = [
        USER_METADATA,
        USER_LOGGED_IN,
        USER_CONSENT,
        USER_SEARCHING,
        USER_ID,
    ];
}

/// Configuration for a session accessor.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Namespace prepended to every reserved key as `<prefix>.<key>`.
    pub key_prefix: Option<String>,
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key namespace. An empty prefix means no namespace.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.key_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Resolves the store key for a reserved base name.
    #[must_use]
    pub fn store_key(&self, base: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{prefix}.{base}"),
            None => base.to_string(),
        }
    }
}

/// Resolved store keys, one per logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    /// Key for [`crate::UserMetadata`].
    pub user_metadata: String,
    /// Key for [`crate::LoginState`].
    pub logged_in: String,
    /// Key for the consent flag.
    pub consent: String,
    /// Key for the searching flag.
    pub searching: String,
    /// Key for the user identifier.
    pub user_id: String,
}

impl StoreKeys {
    /// Resolves every reserved key under `config`.
    #[must_use]
    pub fn resolve(config: &Config) -> Self {
        Self {
            user_metadata: config.store_key(keys::USER_METADATA),
            logged_in: config.store_key(keys::USER_LOGGED_IN),
            consent: config.store_key(keys::USER_CONSENT),
            searching: config.store_key(keys::USER_SEARCHING),
            user_id: config.store_key(keys::USER_ID),
        }
    }

    /// Returns the keys in a fixed order.
    #[must_use]
    pub fn all(&self) -> [&str; 5] {
        [
            self.user_metadata.as_str(),
            self.logged_in.as_str(),
            self.consent.as_str(),
            self.searching.as_str(),
            self.user_id.as_str(),
        ]
    }
}
