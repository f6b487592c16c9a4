//! Stored record types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cached profile metadata.
///
/// The accessor stores and returns the record whole and never validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetadata {
    /// Profile identifier.
    pub id: String,
    /// Phone number as entered.
    pub phone: String,
    /// Cities, in the order the profile lists them.
    pub cities: Vec<String>,
    /// Timestamp of the last profile update, in Unix milliseconds.
    pub last_date: u64,
}

/// Login flag with the time it stops being trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginState {
    /// Whether the user was logged in when the record was written.
    pub logged_in: bool,
    /// Expiry in Unix milliseconds.
    pub expiry: u64,
}

impl LoginState {
    /// Returns true while `now_millis` is strictly before the expiry.
    #[must_use]
    pub const fn is_valid_at(&self, now_millis: u64) -> bool {
        self.expiry > now_millis
    }
}

/// Where the login record sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginValidity {
    /// No record is stored.
    Absent,
    /// A record is stored and has not expired.
    Valid(LoginState),
    /// A record is stored but its expiry has passed. The next
    /// [`crate::SessionStore::get_logged_in`] removes it.
    Expired(LoginState),
}

impl LoginValidity {
    /// Classifies an optional record at `now_millis`.
    #[must_use]
    pub fn at(state: Option<LoginState>, now_millis: u64) -> Self {
        match state {
            None => LoginValidity::Absent,
            Some(state) if state.is_valid_at(now_millis) => LoginValidity::Valid(state),
            Some(state) => LoginValidity::Expired(state),
        }
    }
}

/// Raw contents of every reserved key, without defaults or expiry handling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Raw value of the metadata key.
    pub user_metadata: Option<Value>,
    /// Raw value of the login key.
    pub logged_in: Option<Value>,
    /// Raw value of the consent key.
    pub consent: Option<Value>,
    /// Raw value of the searching key.
    pub searching: Option<Value>,
    /// Raw value of the identifier key.
    pub user_id: Option<Value>,
}
