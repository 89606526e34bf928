//! Pluggable credential resolvers.
//!
//! A login walks an ordered chain of resolvers; the first one that recognises
//! the credentials decides who the actor is and later resolvers are not asked.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gestio_core::UserId;

use crate::directory::UserDirectory;
use crate::storage::{ADMIN_CREDENTIALS_KEY, SessionStorage};
use crate::user::User;
use crate::{Role, StandardRole};

/// Transport-level failure inside a resolver (e.g. identity provider down).
///
/// Never reaches the caller of `login`; it is logged and reported as a
/// generic credential rejection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("identity backend unavailable: {0}")]
    Unavailable(String),
}

/// One strategy in the credential chain.
pub trait CredentialResolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `Ok(Some(user))` when these credentials identify `user`, `Ok(None)`
    /// when this resolver does not recognise them.
    fn resolve(
        &self,
        identifier: &str,
        secret: &str,
        directory: &UserDirectory,
    ) -> Result<Option<User>, ResolverError>;
}

fn same_identifier(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// A built-in account outside the directory, carrying the role's defaults.
fn builtin_account(name: &str, role: Role) -> User {
    let permissions = role.default_permissions().unwrap_or_default();
    User::new(UserId::SYSTEM, name.trim(), role, permissions)
}

/// A directory user named `name`, or a built-in account outside the directory.
fn account_for(name: &str, role: Role, directory: &UserDirectory) -> User {
    match directory.find_by_name(name) {
        Some(user) => user.clone(),
        None => builtin_account(name, role),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stored administrator override
// ─────────────────────────────────────────────────────────────────────────────

/// Administrator override credentials, persisted under [`ADMIN_CREDENTIALS_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read the stored record. Missing or unreadable records yield `None`.
    pub fn load<S: SessionStorage + ?Sized>(storage: &S) -> Option<Self> {
        let raw = match storage.load(ADMIN_CREDENTIALS_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!("failed to read admin credentials: {err:?}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(creds) => Some(creds),
            Err(err) => {
                tracing::warn!("ignoring corrupt admin credentials record: {err}");
                None
            }
        }
    }

    pub fn save<S: SessionStorage + ?Sized>(&self, storage: &S) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        storage.save(ADMIN_CREDENTIALS_KEY, &json)
    }

    pub fn clear<S: SessionStorage + ?Sized>(storage: &S) -> anyhow::Result<()> {
        storage.remove(ADMIN_CREDENTIALS_KEY)
    }
}

/// Checks the persisted administrator override record.
pub struct StoredAdminCredentials {
    storage: Arc<dyn SessionStorage>,
}

impl StoredAdminCredentials {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }
}

impl CredentialResolver for StoredAdminCredentials {
    fn name(&self) -> &'static str {
        "stored-admin"
    }

    fn resolve(
        &self,
        identifier: &str,
        secret: &str,
        directory: &UserDirectory,
    ) -> Result<Option<User>, ResolverError> {
        let Some(creds) = AdminCredentials::load(self.storage.as_ref()) else {
            return Ok(None);
        };
        if !same_identifier(&creds.username, identifier) || creds.password != secret {
            return Ok(None);
        }

        let mut user = account_for(&creds.username, Role::ADMINISTRATOR, directory);
        // The override always acts as Administrator, whatever the directory says.
        user.role = Role::ADMINISTRATOR;
        Ok(Some(user))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bootstrap accounts (demo builds only)
// ─────────────────────────────────────────────────────────────────────────────

/// A hard-coded login available before any real account exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAccount {
    pub identifier: &'static str,
    pub secret: &'static str,
    pub role: StandardRole,
}

/// Accounts installed when demo mode is on.
pub const DEMO_BOOTSTRAP_ACCOUNTS: &[BootstrapAccount] = &[
    BootstrapAccount {
        identifier: "admin",
        secret: "admin123",
        role: StandardRole::Administrator,
    },
    BootstrapAccount {
        identifier: "manager",
        secret: "manager123",
        role: StandardRole::Manager,
    },
];

/// Checks a fixed table of bootstrap accounts.
#[derive(Debug, Clone)]
pub struct BootstrapCredentials {
    accounts: Vec<BootstrapAccount>,
}

impl BootstrapCredentials {
    pub fn new(accounts: Vec<BootstrapAccount>) -> Self {
        Self { accounts }
    }

    pub fn demo() -> Self {
        Self::new(DEMO_BOOTSTRAP_ACCOUNTS.to_vec())
    }
}

impl CredentialResolver for BootstrapCredentials {
    fn name(&self) -> &'static str {
        "bootstrap"
    }

    fn resolve(
        &self,
        identifier: &str,
        secret: &str,
        _directory: &UserDirectory,
    ) -> Result<Option<User>, ResolverError> {
        let account = self
            .accounts
            .iter()
            .find(|a| same_identifier(a.identifier, identifier) && a.secret == secret);

        // Never a directory record: a same-named user must not be taken over.
        Ok(account.map(|a| builtin_account(a.identifier, Role::from(a.role))))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory users with a shared secret
// ─────────────────────────────────────────────────────────────────────────────

/// Any directory user, by name, with one shared demo secret.
#[derive(Debug, Clone)]
pub struct DirectoryCredentials {
    shared_secret: String,
}

impl DirectoryCredentials {
    pub fn new(shared_secret: impl Into<String>) -> Self {
        Self {
            shared_secret: shared_secret.into(),
        }
    }
}

impl CredentialResolver for DirectoryCredentials {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn resolve(
        &self,
        identifier: &str,
        secret: &str,
        directory: &UserDirectory,
    ) -> Result<Option<User>, ResolverError> {
        if self.shared_secret.is_empty() || secret != self.shared_secret {
            return Ok(None);
        }
        Ok(directory.find_by_name(identifier).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::inventory;
    use crate::storage::InMemoryStorage;

    fn directory() -> UserDirectory {
        UserDirectory::from_users(vec![
            User::new(
                UserId::new(1),
                "Jean Dupont",
                Role::from(StandardRole::Technician),
                vec![inventory::VIEW],
            ),
            User::new(
                UserId::new(2),
                "admin",
                Role::from(StandardRole::Viewer),
                vec![],
            ),
        ])
    }

    #[test]
    fn directory_resolver_needs_the_shared_secret() {
        let resolver = DirectoryCredentials::new("password123");
        let dir = directory();

        let user = resolver.resolve("Jean Dupont", "password123", &dir).unwrap().unwrap();
        assert_eq!(user.id, UserId::new(1));

        assert_eq!(resolver.resolve("Jean Dupont", "nope", &dir).unwrap(), None);
        assert_eq!(resolver.resolve("Nobody", "password123", &dir).unwrap(), None);

        // An empty shared secret disables the resolver entirely.
        let disabled = DirectoryCredentials::new("");
        assert_eq!(disabled.resolve("Jean Dupont", "", &dir).unwrap(), None);
    }

    #[test]
    fn bootstrap_accounts_outside_the_directory_get_the_system_id() {
        let resolver = BootstrapCredentials::demo();
        let user = resolver
            .resolve("manager", "manager123", &UserDirectory::new())
            .unwrap()
            .unwrap();
        assert_eq!(user.id, UserId::SYSTEM);
        assert_eq!(user.role, Role::from(StandardRole::Manager));
        assert_eq!(user.permissions, StandardRole::Manager.default_permissions());

        let wrong_case = resolver.resolve("manager", "MANAGER123", &UserDirectory::new());
        assert_eq!(wrong_case.unwrap(), None);
    }

    #[test]
    fn bootstrap_login_never_takes_over_a_same_named_directory_user() {
        let resolver = BootstrapCredentials::demo();
        let user = resolver.resolve("admin", "admin123", &directory()).unwrap().unwrap();

        assert_eq!(user.id, UserId::SYSTEM);
        assert!(user.role.is_administrator());
    }

    #[test]
    fn stored_admin_override_forces_administrator() {
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemoryStorage::new());
        let resolver = StoredAdminCredentials::new(storage.clone());
        let dir = directory();

        assert_eq!(resolver.resolve("admin", "s3cret", &dir).unwrap(), None);

        AdminCredentials::new("admin", "s3cret").save(storage.as_ref()).unwrap();
        let user = resolver.resolve(" Admin ", "s3cret", &dir).unwrap().unwrap();
        assert_eq!(user.id, UserId::new(2));
        assert!(user.role.is_administrator());

        AdminCredentials::clear(storage.as_ref()).unwrap();
        assert_eq!(resolver.resolve("admin", "s3cret", &dir).unwrap(), None);
    }

    #[test]
    fn corrupt_admin_record_is_ignored() {
        let storage = InMemoryStorage::new();
        storage.save(ADMIN_CREDENTIALS_KEY, "[]").unwrap();
        assert_eq!(AdminCredentials::load(&storage), None);
    }
}
