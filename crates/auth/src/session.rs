//! The single "current actor" and its durable persistence.
//!
//! Exactly one [`Session`] exists per store. It starts anonymous, is replaced
//! on login or identity switch, and reverts to anonymous on logout or when the
//! persisted record cannot be read back. Every mutation is saved immediately
//! and broadcast to subscribers.

use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gestio_core::UserId;

use crate::directory::UserDirectory;
use crate::error::UserNotFoundError;
use crate::storage::{SESSION_KEY, SessionStorage};
use crate::user::User;
use crate::{Permission, Role};

/// Who is acting now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub is_authenticated: bool,
    #[serde(default)]
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Placeholder session held before login and after logout.
    pub fn anonymous() -> Self {
        Self {
            user: User::anonymous(),
            is_authenticated: false,
            authenticated_at: None,
        }
    }

    pub fn authenticated(user: User, at: DateTime<Utc>) -> Self {
        Self {
            user,
            is_authenticated: true,
            authenticated_at: Some(at),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Broadcast on every session mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user was adopted (login or identity switch).
    Authenticated(Session),
    /// The acting user's record changed in place (profile or permission edit).
    Updated(Session),
    /// The session reverted to anonymous.
    SignedOut,
}

/// Receiving end of a session subscription.
///
/// Each subscription sees every event published after it was created, in
/// publication order.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Block until the next event is available.
    pub fn recv(&self) -> Result<SessionEvent, RecvError> {
        self.receiver.recv()
    }

    pub fn try_recv(&self) -> Result<SessionEvent, TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything published so far without blocking.
    pub fn drain(&self) -> Vec<SessionEvent> {
        self.receiver.try_iter().collect()
    }
}

/// A persisted session record that could not be used. Always recovered
/// by falling back to the anonymous session.
#[derive(Debug, Error)]
enum StorageCorruptionError {
    #[error("failed to read session record: {0}")]
    Unreadable(String),

    #[error("failed to parse session record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("session record claims authentication for the anonymous placeholder")]
    AnonymousAuthenticated,
}

/// Single-writer store for the current session.
pub struct SessionStore<S> {
    storage: S,
    current: Session,
    subscribers: Mutex<Vec<Sender<SessionEvent>>>,
}

impl<S> core::fmt::Debug for SessionStore<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<S> SessionStore<S>
where
    S: SessionStorage,
{
    /// Open the store, restoring the previously saved session if it is readable.
    ///
    /// Never fails: absent or corrupt data yields the anonymous session.
    pub fn open(storage: S) -> Self {
        let current = restore(&storage);
        Self {
            storage,
            current,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn current(&self) -> &Session {
        &self.current
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn subscribe(&self) -> SessionSubscription {
        let (tx, rx) = mpsc::channel();

        // On a poisoned lock the subscription simply never receives anything.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        SessionSubscription { receiver: rx }
    }

    /// Adopt `user` as the authenticated actor, persist and notify.
    pub fn adopt(&mut self, user: User) -> &Session {
        tracing::info!(user_id = %user.id, role = %user.role, "session adopted user");
        self.current = Session::authenticated(user, Utc::now());
        self.persist();
        self.publish(SessionEvent::Authenticated(self.current.clone()));
        &self.current
    }

    /// Reset to anonymous and drop the persisted record.
    pub fn clear(&mut self) {
        if self.current.is_authenticated {
            tracing::info!(user_id = %self.current.user.id, "session cleared");
        }
        self.current = Session::anonymous();
        if let Err(err) = self.storage.remove(SESSION_KEY) {
            tracing::warn!("failed to remove persisted session: {err:?}");
        }
        self.publish(SessionEvent::SignedOut);
    }

    /// Operator-initiated identity switch (demo affordance, not a security boundary).
    pub fn switch_identity(
        &mut self,
        id: UserId,
        directory: &UserDirectory,
    ) -> Result<&Session, UserNotFoundError> {
        let user = directory.get(id).cloned().ok_or(UserNotFoundError { id })?;
        Ok(self.adopt(user))
    }

    /// Re-read the persisted record, as a process restart would.
    pub fn reload(&mut self) -> &Session {
        self.current = restore(&self.storage);
        &self.current
    }

    /// Mirror an edited directory record into the session if it is the acting user.
    ///
    /// Returns whether the session changed.
    pub fn sync_user(&mut self, user: &User) -> bool {
        if !self.current.is_authenticated || self.current.user.id != user.id {
            return false;
        }
        self.current.user = user.clone();
        self.persist();
        self.publish(SessionEvent::Updated(self.current.clone()));
        true
    }

    /// Apply a bulk role edit to the acting user if they hold `role`.
    pub fn sync_role_permissions(&mut self, role: &Role, permissions: &[Permission]) -> bool {
        if !self.current.is_authenticated || &self.current.user.role != role {
            return false;
        }
        self.current.user.set_permissions(permissions.to_vec());
        self.persist();
        self.publish(SessionEvent::Updated(self.current.clone()));
        true
    }

    fn persist(&self) {
        let result = if self.current.is_authenticated {
            serde_json::to_string(&self.current)
                .map_err(anyhow::Error::from)
                .and_then(|json| self.storage.save(SESSION_KEY, &json))
        } else {
            self.storage.remove(SESSION_KEY)
        };

        // The in-memory session stays authoritative when the write fails.
        if let Err(err) = result {
            tracing::warn!("failed to persist session: {err:?}");
        }
    }

    fn publish(&self, event: SessionEvent) {
        if let Ok(mut subs) = self.subscribers.lock() {
            // Drop any dead subscribers while publishing.
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

fn restore<S: SessionStorage>(storage: &S) -> Session {
    match load_session(storage) {
        Ok(Some(session)) => {
            tracing::debug!(user_id = %session.user.id, "restored persisted session");
            session
        }
        Ok(None) => Session::anonymous(),
        Err(err) => {
            tracing::warn!("discarding persisted session: {err}");
            Session::anonymous()
        }
    }
}

fn load_session<S: SessionStorage>(storage: &S) -> Result<Option<Session>, StorageCorruptionError> {
    let raw = storage
        .load(SESSION_KEY)
        .map_err(|e| StorageCorruptionError::Unreadable(format!("{e:#}")))?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    let session: Session = serde_json::from_str(&raw)?;
    if !session.is_authenticated {
        return Ok(None);
    }
    if session.user.id.is_anonymous() {
        return Err(StorageCorruptionError::AnonymousAuthenticated);
    }
    Ok(Some(session))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::StandardRole;
    use crate::catalogue::inventory;
    use crate::storage::InMemoryStorage;

    fn jean() -> User {
        User::new(
            UserId::new(1),
            "Jean Dupont",
            Role::from(StandardRole::Technician),
            vec![inventory::VIEW],
        )
    }

    #[test]
    fn starts_anonymous_without_a_record() {
        let store = SessionStore::open(InMemoryStorage::new());
        assert_eq!(store.current(), &Session::anonymous());
    }

    #[test]
    fn adopted_session_survives_a_restart() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut store = SessionStore::open(storage.clone());
        store.adopt(jean());

        let restarted = SessionStore::open(storage);
        assert_eq!(restarted.current().user.id, UserId::new(1));
        assert!(restarted.current().is_authenticated);
        assert!(restarted.current().authenticated_at.is_some());
    }

    #[test]
    fn corrupt_record_falls_back_to_anonymous() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.save(SESSION_KEY, "{not json").unwrap();
        assert_eq!(SessionStore::open(storage.clone()).current(), &Session::anonymous());

        // Structurally valid but authenticated as the placeholder.
        let forged = Session {
            is_authenticated: true,
            ..Session::anonymous()
        };
        storage.save(SESSION_KEY, &serde_json::to_string(&forged).unwrap()).unwrap();
        assert_eq!(SessionStore::open(storage).current(), &Session::anonymous());
    }

    #[test]
    fn clear_removes_the_record() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut store = SessionStore::open(storage.clone());
        store.adopt(jean());
        store.clear();

        assert!(!store.current().is_authenticated);
        assert_eq!(storage.load(SESSION_KEY).unwrap(), None);
        assert!(!store.reload().is_authenticated);
    }

    #[test]
    fn switch_identity_requires_a_known_user() {
        let directory = UserDirectory::from_users(vec![jean()]);
        let mut store = SessionStore::open(InMemoryStorage::new());

        let err = store.switch_identity(UserId::new(5), &directory).unwrap_err();
        assert_eq!(err.id, UserId::new(5));
        assert!(!store.current().is_authenticated);

        store.switch_identity(UserId::new(1), &directory).unwrap();
        assert_eq!(store.current().user.name, "Jean Dupont");
    }

    #[test]
    fn subscribers_see_every_mutation_in_order() {
        let mut store = SessionStore::open(InMemoryStorage::new());
        let sub = store.subscribe();

        store.adopt(jean());
        let mut renamed = jean();
        renamed.name = "J. Dupont".into();
        assert!(store.sync_user(&renamed));
        store.clear();

        let events = sub.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            SessionEvent::Authenticated(s) if s.user.name == "Jean Dupont"
        ));
        assert!(matches!(&events[1], SessionEvent::Updated(s) if s.user.name == "J. Dupont"));
        assert_eq!(events[2], SessionEvent::SignedOut);
    }

    #[test]
    fn dropped_subscribers_do_not_block_publishing() {
        let mut store = SessionStore::open(InMemoryStorage::new());
        drop(store.subscribe());
        let live = store.subscribe();
        store.adopt(jean());
        assert!(matches!(live.try_recv(), Ok(SessionEvent::Authenticated(_))));
    }

    #[test]
    fn role_sync_only_touches_holders() {
        let technician = Role::from(StandardRole::Technician);
        let manager = Role::from(StandardRole::Manager);
        let mut store = SessionStore::open(InMemoryStorage::new());
        assert!(!store.sync_role_permissions(&technician, &[inventory::EDIT]));

        store.adopt(jean());
        assert!(!store.sync_role_permissions(&manager, &[inventory::EDIT]));
        assert!(store.sync_role_permissions(&technician, &[inventory::EDIT]));
        assert_eq!(store.current().user.permissions, vec![inventory::EDIT]);
    }

    struct FailingStorage;

    impl SessionStorage for FailingStorage {
        fn load(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow::anyhow!("disk on fire"))
        }

        fn save(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk on fire"))
        }

        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk on fire"))
        }
    }

    #[test]
    fn storage_failures_are_not_fatal() {
        let mut store = SessionStore::open(FailingStorage);
        assert!(!store.current().is_authenticated);

        store.adopt(jean());
        assert!(store.current().is_authenticated);

        store.clear();
        assert!(!store.current().is_authenticated);
    }
}
