//! Typed accessor over the session keys of a [`KvStore`].
//!
//! Each logical field lives under one reserved key. Reads apply the field's
//! default at this boundary, so stores only ever hold what was written.
//!
//! # Concurrency
//!
//! No lock is held between a read and the write that follows it. Other
//! handles on the same store may write in between, and the last writer wins.
//! In particular, two concurrent first calls to
//! [`SessionStore::get_user_id`] can both generate an identifier; callers
//! must not rely on a single identifier being created.

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, StoreKeys, LOGIN_TTL};
use crate::error::{CoreError, CoreResult};
use crate::model::{LoginState, LoginValidity, SessionSnapshot, UserMetadata};
use extstate_storage::{KvStore, StorageChange, Subscription};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session and user state accessor.
///
/// Cloning is cheap; clones share the store and clock.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    keys: StoreKeys,
}

impl SessionStore {
    /// Creates an accessor with the default configuration and system clock.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_config(store, &Config::default())
    }

    /// Creates an accessor with the given configuration and system clock.
    pub fn with_config(store: Arc<dyn KvStore>, config: &Config) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            keys: StoreKeys::resolve(config),
        }
    }

    /// Replaces the clock used for login expiry.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the resolved store keys.
    pub fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Overwrites the stored metadata record.
    pub async fn set_user_metadata(&self, metadata: &UserMetadata) -> CoreResult<()> {
        self.write(&self.keys.user_metadata, metadata).await
    }

    /// Returns the stored metadata, or `None` if it was never set.
    pub async fn get_user_metadata(&self) -> CoreResult<Option<UserMetadata>> {
        self.read(&self.keys.user_metadata).await
    }

    /// Stores the login flag with an expiry one hour from now.
    ///
    /// Any previous record is replaced and its expiry window reset.
    pub async fn set_logged_in(&self, logged_in: bool) -> CoreResult<()> {
        let expiry = self
            .clock
            .now_millis()
            .saturating_add(LOGIN_TTL.as_millis() as u64);
        self.write(&self.keys.logged_in, &LoginState { logged_in, expiry })
            .await
    }

    /// Returns the login flag.
    ///
    /// - `None` if no record is stored; treat it as logged out
    /// - the stored flag if the record has not expired
    /// - `Some(false)` if the record has expired, after removing it
    pub async fn get_logged_in(&self) -> CoreResult<Option<bool>> {
        match self.login_state().await? {
            LoginValidity::Absent => Ok(None),
            LoginValidity::Valid(state) => Ok(Some(state.logged_in)),
            LoginValidity::Expired(state) => {
                self.store.remove(&self.keys.logged_in).await?;
                info!(expiry = state.expiry, "login record expired and removed");
                Ok(Some(false))
            }
        }
    }

    /// Reports the login record's lifecycle position without side effects.
    ///
    /// Unlike [`SessionStore::get_logged_in`], an expired record is left in
    /// place.
    pub async fn login_state(&self) -> CoreResult<LoginValidity> {
        let state: Option<LoginState> = self.read(&self.keys.logged_in).await?;
        Ok(LoginValidity::at(state, self.clock.now_millis()))
    }

    /// Registers `callback` for every change of the login key.
    ///
    /// The callback receives the new `loggedIn` flag, or `false` when the
    /// record was removed. It also fires for writes made through other
    /// handles on the same store. The listener stays attached until
    /// [`Subscription::unsubscribe`] is called.
    pub fn on_logged_in_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let key = self.keys.logged_in.clone();
        self.store.listen(Arc::new(move |change: &StorageChange| {
            if change.key != key {
                return;
            }
            match logged_in_from_change(change) {
                Ok(logged_in) => callback(logged_in),
                Err(err) => warn!(key = %change.key, error = %err, "ignoring login change"),
            }
        }))
    }

    /// Returns the consent flag, `false` if never set.
    pub async fn get_consent(&self) -> CoreResult<bool> {
        Ok(self.read(&self.keys.consent).await?.unwrap_or(false))
    }

    /// Stores the consent flag.
    pub async fn set_consent(&self, consent: bool) -> CoreResult<()> {
        self.write(&self.keys.consent, &consent).await
    }

    /// Returns the searching flag, `false` if never set.
    pub async fn get_is_searching(&self) -> CoreResult<bool> {
        Ok(self.read(&self.keys.searching).await?.unwrap_or(false))
    }

    /// Stores the searching flag.
    pub async fn set_is_searching(&self, is_searching: bool) -> CoreResult<()> {
        self.write(&self.keys.searching, &is_searching).await
    }

    /// Returns the persisted user identifier, creating one if absent.
    ///
    /// An empty stored identifier counts as absent. Creation is a plain
    /// read followed by a write; see the module docs on concurrency.
    pub async fn get_user_id(&self) -> CoreResult<String> {
        let stored: Option<String> = self.read(&self.keys.user_id).await?;
        if let Some(id) = stored.filter(|id| !id.is_empty()) {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        self.set_user_id(&id).await?;
        info!(user_id = %id, "generated user id");
        Ok(id)
    }

    /// Overwrites the stored user identifier.
    pub async fn set_user_id(&self, id: &str) -> CoreResult<()> {
        self.write(&self.keys.user_id, id).await
    }

    /// Reads every reserved key raw.
    pub async fn snapshot(&self) -> CoreResult<SessionSnapshot> {
        Ok(SessionSnapshot {
            user_metadata: self.store.get(&self.keys.user_metadata).await?,
            logged_in: self.store.get(&self.keys.logged_in).await?,
            consent: self.store.get(&self.keys.consent).await?,
            searching: self.store.get(&self.keys.searching).await?,
            user_id: self.store.get(&self.keys.user_id).await?,
        })
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Option<T>> {
        let value = self.store.get(key).await?;
        debug!(key, present = value.is_some(), "read");
        decode(key, value)
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CoreResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|err| CoreError::malformed(key, err.to_string()))?;
        self.store.set(key, value).await?;
        debug!(key, "write");
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// Decodes a raw value, treating `null` as absent.
fn decode<T: DeserializeOwned>(key: &str, value: Option<Value>) -> CoreResult<Option<T>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(|err| {
            warn!(key, error = %err, "stored value does not decode");
            CoreError::malformed(key, err.to_string())
        }),
    }
}

fn logged_in_from_change(change: &StorageChange) -> CoreResult<bool> {
    let state: Option<LoginState> = decode(&change.key, change.new_value.clone())?;
    Ok(state.is_some_and(|state| state.logged_in))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::keys;
    use async_trait::async_trait;
    use extstate_storage::{
        InMemoryStore, Listener, StorageChange, StorageError, StorageResult, StoreConfig,
    };
    use serde_json::{json, Value};
    use tokio::sync::mpsc::UnboundedReceiver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const START: u64 = 1_700_000_000_000;

    fn setup() -> (InMemoryStore, ManualClock, SessionStore) {
        let store = InMemoryStore::new();
        let clock = ManualClock::new(START);
        let session = SessionStore::new(Arc::new(store.clone())).clock(Arc::new(clock.clone()));
        (store, clock, session)
    }

    #[tokio::test]
    async fn set_logged_in_writes_expiry() {
        let (store, _clock, session) = setup();
        session.set_logged_in(true).await.unwrap();

        let raw = store.get(keys::USER_LOGGED_IN).await.unwrap().unwrap();
        assert_eq!(raw, json!({"loggedIn": true, "expiry": START + 3_600_000}));
    }

    #[tokio::test]
    async fn set_logged_in_resets_window() {
        let (_store, clock, session) = setup();
        session.set_logged_in(true).await.unwrap();
        clock.advance(Duration::from_secs(50 * 60));
        session.set_logged_in(true).await.unwrap();
        clock.advance(Duration::from_secs(50 * 60));

        assert_eq!(session.get_logged_in().await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn expiry_at_exact_boundary_is_expired() {
        let (store, clock, session) = setup();
        session.set_logged_in(true).await.unwrap();
        clock.advance(LOGIN_TTL);

        assert!(matches!(
            session.login_state().await.unwrap(),
            LoginValidity::Expired(_)
        ));
        assert_eq!(session.get_logged_in().await.unwrap(), Some(false));
        assert!(!store.contains_key(keys::USER_LOGGED_IN));
        assert_eq!(session.login_state().await.unwrap(), LoginValidity::Absent);
    }

    #[tokio::test]
    async fn login_state_has_no_side_effects() {
        let (store, clock, session) = setup();
        session.set_logged_in(false).await.unwrap();
        clock.advance(Duration::from_secs(2 * 60 * 60));

        session.login_state().await.unwrap();
        assert!(store.contains_key(keys::USER_LOGGED_IN));
    }

    #[tokio::test]
    async fn null_values_count_as_absent() {
        let (store, _clock, session) = setup();
        store.set(keys::USER_CONSENT, Value::Null).await.unwrap();
        store.set(keys::USER_LOGGED_IN, Value::Null).await.unwrap();
        store.set(keys::USER_METADATA, Value::Null).await.unwrap();

        assert!(!session.get_consent().await.unwrap());
        assert_eq!(session.get_logged_in().await.unwrap(), None);
        assert_eq!(session.get_user_metadata().await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_values_are_reported() {
        let (store, _clock, session) = setup();
        store.set(keys::USER_SEARCHING, json!("yes")).await.unwrap();
        store.set(keys::USER_LOGGED_IN, json!(true)).await.unwrap();

        let err = session.get_is_searching().await.unwrap_err();
        assert!(matches!(err, CoreError::MalformedValue { ref key, .. } if key == "userSearching"));
        assert!(session.get_logged_in().await.is_err());
    }

    #[tokio::test]
    async fn empty_user_id_is_replaced() {
        let (_store, _clock, session) = setup();
        session.set_user_id("").await.unwrap();

        let id = session.get_user_id().await.unwrap();
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(session.get_user_id().await.unwrap(), id);
    }

    #[tokio::test]
    async fn prefixed_keys_are_used() {
        let store = InMemoryStore::new();
        let session = SessionStore::with_config(
            Arc::new(store.clone()),
            &Config::new().key_prefix("ext"),
        );
        session.set_consent(true).await.unwrap();

        assert!(store.contains_key("ext.userConsent"));
        assert!(!store.contains_key(keys::USER_CONSENT));
    }

    #[tokio::test]
    async fn listener_ignores_other_keys() {
        let (_store, _clock, session) = setup();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _sub = session.on_logged_in_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        session.set_consent(true).await.unwrap();
        session.set_user_id("abc").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn listener_sees_expiry_removal_as_false() {
        let (_store, clock, session) = setup();
        session.set_logged_in(true).await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = session.on_logged_in_change(move |logged_in| {
            sink.lock().unwrap().push(logged_in);
        });

        clock.advance(LOGIN_TTL + Duration::from_millis(1));
        session.get_logged_in().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![false]);
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let store = InMemoryStore::with_config(StoreConfig::new().quota_bytes(8));
        let session = SessionStore::new(Arc::new(store.clone()));

        let err = session.set_user_id("a-long-identifier").await.unwrap_err();
        assert!(err.is_storage_unavailable());

        store.close();
        assert!(session.get_consent().await.unwrap_err().is_storage_unavailable());
        assert!(session.get_user_id().await.unwrap_err().is_storage_unavailable());
    }

    /// Store whose removals always fail; everything else goes to `inner`.
    struct FailingRemoveStore {
        inner: InMemoryStore,
    }

    #[async_trait]
    impl KvStore for FailingRemoveStore {
        async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        }

        fn subscribe_changes(&self) -> UnboundedReceiver<StorageChange> {
            self.inner.subscribe_changes()
        }

        fn listen(&self, listener: Listener) -> Subscription {
            self.inner.listen(listener)
        }
    }

    #[tokio::test]
    async fn failed_expiry_removal_propagates() {
        let inner = InMemoryStore::new();
        let clock = ManualClock::new(START);
        let session = SessionStore::new(Arc::new(FailingRemoveStore {
            inner: inner.clone(),
        }))
        .clock(Arc::new(clock.clone()));

        session.set_logged_in(true).await.unwrap();
        clock.advance(LOGIN_TTL + Duration::from_millis(1));

        let err = session.get_logged_in().await.unwrap_err();
        assert!(err.is_storage_unavailable());
        assert!(inner.contains_key(keys::USER_LOGGED_IN));
        assert!(matches!(
            session.login_state().await.unwrap(),
            LoginValidity::Expired(_)
        ));
    }

    #[tokio::test]
    async fn snapshot_is_raw() {
        let (_store, clock, session) = setup();
        session.set_logged_in(true).await.unwrap();
        session.set_consent(false).await.unwrap();
        clock.advance(Duration::from_secs(3 * 60 * 60));

        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.consent, Some(json!(false)));
        assert_eq!(snapshot.searching, None);
        assert!(snapshot.logged_in.is_some());
    }
}
