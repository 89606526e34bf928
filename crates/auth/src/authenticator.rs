//! Login/logout state machine: `Anonymous -> Pending -> {Authenticated | Anonymous}`.

use crate::credentials::CredentialResolver;
use crate::directory::UserDirectory;
use crate::error::AuthError;
use crate::session::{Session, SessionStore};
use crate::storage::SessionStorage;
use crate::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    /// A login is being resolved.
    Pending,
    Authenticated,
}

/// Validates credentials against an ordered resolver chain and drives the
/// session store accordingly.
pub struct Authenticator {
    resolvers: Vec<Box<dyn CredentialResolver>>,
    state: AuthState,
}

impl core::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authenticator")
            .field("resolvers", &self.resolver_names())
            .field("state", &self.state)
            .finish()
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator {
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
            state: AuthState::Anonymous,
        }
    }

    /// Append a resolver; earlier resolvers take precedence.
    pub fn with_resolver(mut self, resolver: impl CredentialResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Bring the state in line with a session restored from storage.
    pub fn observe(&mut self, session: &Session) {
        self.state = if session.is_authenticated {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        };
    }

    /// Resolve credentials and adopt the matching user.
    ///
    /// On rejection the session reverts to anonymous. Resolver failures are
    /// reported exactly like wrong credentials.
    pub fn login<S: SessionStorage>(
        &mut self,
        identifier: &str,
        secret: &str,
        directory: &UserDirectory,
        sessions: &mut SessionStore<S>,
    ) -> Result<Session, AuthError> {
        self.state = AuthState::Pending;

        match self.resolve(identifier, secret, directory) {
            Some((resolver, user)) => {
                tracing::info!(user_id = %user.id, resolver, "login succeeded");
                let session = sessions.adopt(user).clone();
                self.state = AuthState::Authenticated;
                Ok(session)
            }
            None => {
                tracing::warn!(identifier = identifier.trim(), "login rejected");
                sessions.clear();
                self.state = AuthState::Anonymous;
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Unconditionally clear the session. Never fails.
    pub fn logout<S: SessionStorage>(&mut self, sessions: &mut SessionStore<S>) {
        sessions.clear();
        self.state = AuthState::Anonymous;
    }

    fn resolve(
        &self,
        identifier: &str,
        secret: &str,
        directory: &UserDirectory,
    ) -> Option<(&'static str, User)> {
        for resolver in &self.resolvers {
            match resolver.resolve(identifier, secret, directory) {
                Ok(Some(user)) => return Some((resolver.name(), user)),
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(resolver = resolver.name(), "credential resolver failed: {err}");
                    continue;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use gestio_core::UserId;

    use super::*;
    use crate::credentials::{BootstrapCredentials, DirectoryCredentials, ResolverError};
    use crate::storage::InMemoryStorage;
    use crate::{Role, StandardRole};

    struct Unreachable;

    impl CredentialResolver for Unreachable {
        fn name(&self) -> &'static str {
            "unreachable-idp"
        }

        fn resolve(
            &self,
            _: &str,
            _: &str,
            _: &UserDirectory,
        ) -> Result<Option<User>, ResolverError> {
            Err(ResolverError::Unavailable("connection refused".into()))
        }
    }

    struct Counting(Arc<AtomicUsize>);

    impl CredentialResolver for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn resolve(
            &self,
            _: &str,
            _: &str,
            _: &UserDirectory,
        ) -> Result<Option<User>, ResolverError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    fn directory() -> UserDirectory {
        UserDirectory::from_users(vec![User::new(
            UserId::new(1),
            "admin",
            Role::from(StandardRole::Technician),
            vec![],
        )])
    }

    #[test]
    fn first_matching_resolver_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut auth = Authenticator::new()
            .with_resolver(BootstrapCredentials::demo())
            .with_resolver(Counting(calls.clone()))
            .with_resolver(DirectoryCredentials::new("admin123"));
        let mut sessions = SessionStore::open(InMemoryStorage::new());

        // Both bootstrap and directory would accept; bootstrap is asked first.
        let session = auth.login("admin", "admin123", &directory(), &mut sessions).unwrap();
        assert_eq!(session.user.id, UserId::SYSTEM);
        assert!(session.user.role.is_administrator());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(auth.state(), AuthState::Authenticated);
    }

    #[test]
    fn rejection_reverts_to_anonymous() {
        let mut auth = Authenticator::new().with_resolver(DirectoryCredentials::new("pw"));
        let mut sessions = SessionStore::open(InMemoryStorage::new());

        auth.login("admin", "pw", &directory(), &mut sessions).unwrap();
        let err = auth.login("admin", "wrong", &directory(), &mut sessions).unwrap_err();

        assert_eq!(err, AuthError::InvalidCredentials);
        assert!(!sessions.current().is_authenticated);
        assert_eq!(auth.state(), AuthState::Anonymous);
    }

    #[test]
    fn resolver_failures_look_like_bad_credentials() {
        let mut auth = Authenticator::new().with_resolver(Unreachable);
        let mut sessions = SessionStore::open(InMemoryStorage::new());
        assert_eq!(
            auth.login("admin", "pw", &directory(), &mut sessions),
            Err(AuthError::InvalidCredentials)
        );

        // A failing resolver does not stop later ones from matching.
        let mut auth = Authenticator::new()
            .with_resolver(Unreachable)
            .with_resolver(DirectoryCredentials::new("pw"));
        assert!(auth.login("admin", "pw", &directory(), &mut sessions).is_ok());
    }

    #[test]
    fn logout_never_fails() {
        let mut auth = Authenticator::new();
        let mut sessions = SessionStore::open(InMemoryStorage::new());
        auth.logout(&mut sessions);
        auth.logout(&mut sessions);
        assert_eq!(auth.state(), AuthState::Anonymous);
        assert_eq!(auth.resolver_names(), Vec::<&str>::new());
    }
}
