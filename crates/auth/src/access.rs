//! `AccessControl`: the handle feature modules hold.
//!
//! It owns the registry, directory, session store and authenticator, and is
//! the one place where edits cascade (role edit -> holders -> live session,
//! user edit -> live session). Pass it around explicitly; there is no global.
//!
//! The administrative surface is not self-gated. Callers check
//! `users.manage` (or similar) through the evaluator before invoking it.

use std::sync::Arc;

use serde::Serialize;

use gestio_core::UserId;

use crate::authenticator::{AuthState, Authenticator};
use crate::authorize::{self, AuthorizationExplanation};
use crate::catalogue;
use crate::config::EngineConfig;
use crate::credentials::{
    AdminCredentials, BootstrapCredentials, DirectoryCredentials, StoredAdminCredentials,
};
use crate::directory::UserDirectory;
use crate::error::{
    AuthError, AuthzError, CreateRoleError, ProtectedRoleError, UserNotFoundError,
};
use crate::permissions::dedup_permissions;
use crate::registry::RoleRegistry;
use crate::seed;
use crate::session::{Session, SessionStore, SessionSubscription};
use crate::storage::{FileStorage, InMemoryStorage, SessionStorage};
use crate::user::{NewUser, User, UserPatch};
use crate::{Permission, Role};

/// Read-only snapshot of the acting user, re-read on every render/operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub is_authenticated: bool,
}

impl From<&Session> for CurrentUser {
    fn from(session: &Session) -> Self {
        Self {
            id: session.user.id,
            name: session.user.name.clone(),
            role: session.user.role.clone(),
            permissions: session.user.permissions.clone(),
            is_authenticated: session.is_authenticated,
        }
    }
}

pub struct AccessControl {
    registry: RoleRegistry,
    directory: UserDirectory,
    sessions: SessionStore<Arc<dyn SessionStorage>>,
    authenticator: Authenticator,
}

impl core::fmt::Debug for AccessControl {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccessControl")
            .field("registry", &self.registry)
            .field("directory", &self.directory)
            .field("sessions", &self.sessions)
            .field("authenticator", &self.authenticator)
            .finish()
    }
}

impl AccessControl {
    /// Assemble the engine. The role registry is derived from `directory`
    /// and the session is restored from `storage`.
    pub fn new(
        directory: UserDirectory,
        storage: Arc<dyn SessionStorage>,
        mut authenticator: Authenticator,
    ) -> Self {
        let registry = RoleRegistry::from_directory(&directory);
        let sessions = SessionStore::open(storage);
        authenticator.observe(sessions.current());

        Self {
            registry,
            directory,
            sessions,
            authenticator,
        }
    }

    /// Wire storage, resolver chain and seed data from configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        let storage: Arc<dyn SessionStorage> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir.clone())),
            None => Arc::new(InMemoryStorage::new()),
        };
        Self::from_config_with_storage(config, storage)
    }

    /// Like [`from_config`](Self::from_config) with an explicit storage backend.
    pub fn from_config_with_storage(
        config: &EngineConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let mut authenticator =
            Authenticator::new().with_resolver(StoredAdminCredentials::new(storage.clone()));
        if config.demo_mode {
            authenticator = authenticator.with_resolver(BootstrapCredentials::demo());
        }
        if !config.demo_secret.is_empty() {
            authenticator = authenticator
                .with_resolver(DirectoryCredentials::new(config.demo_secret.clone()));
        }

        let directory = if config.seed_demo_users {
            UserDirectory::from_users(seed::demo_users())
        } else {
            UserDirectory::new()
        };

        tracing::info!(
            demo_mode = config.demo_mode,
            users = directory.len(),
            resolvers = ?authenticator.resolver_names(),
            "access control initialised"
        );

        Self::new(directory, storage, authenticator)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        self.sessions.current()
    }

    pub fn current_user(&self) -> CurrentUser {
        CurrentUser::from(self.sessions.current())
    }

    pub fn auth_state(&self) -> AuthState {
        self.authenticator.state()
    }

    pub fn subscribe(&self) -> SessionSubscription {
        self.sessions.subscribe()
    }

    pub fn login(&mut self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        self.authenticator
            .login(identifier, secret, &self.directory, &mut self.sessions)
    }

    /// Boolean form of [`login`](Self::login).
    pub fn login_user(&mut self, identifier: &str, secret: &str) -> bool {
        self.login(identifier, secret).is_ok()
    }

    pub fn logout_user(&mut self) {
        self.authenticator.logout(&mut self.sessions);
    }

    /// Act as another directory user without credentials.
    ///
    /// Demo/operator convenience; never expose this on a production
    /// authorization boundary.
    pub fn switch_user(&mut self, id: UserId) -> Result<(), UserNotFoundError> {
        self.sessions.switch_identity(id, &self.directory)?;
        self.authenticator.observe(self.sessions.current());
        tracing::info!(user_id = %id, "switched identity");
        Ok(())
    }

    /// Store administrator override credentials (checked first on login).
    pub fn set_admin_credentials(&self, credentials: &AdminCredentials) -> anyhow::Result<()> {
        credentials.save(self.sessions.storage().as_ref())
    }

    pub fn clear_admin_credentials(&self) -> anyhow::Result<()> {
        AdminCredentials::clear(self.sessions.storage().as_ref())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    pub fn has_permission(&self, permission: &Permission) -> bool {
        authorize::has_permission(self.sessions.current(), permission)
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        authorize::has_all_permissions(self.sessions.current(), permissions)
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        authorize::has_any_permission(self.sessions.current(), permissions)
    }

    pub fn authorize(&self, permission: &Permission) -> Result<(), AuthzError> {
        authorize::authorize(self.sessions.current(), permission)
    }

    pub fn explain(&self, permission: &Permission) -> AuthorizationExplanation {
        authorize::explain_authorization(self.sessions.current(), permission)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read models
    // ─────────────────────────────────────────────────────────────────────────

    pub fn available_users(&self) -> &[User] {
        self.directory.list()
    }

    pub fn available_roles(&self) -> &[Role] {
        self.registry.list_roles()
    }

    pub fn available_permissions(&self) -> Vec<Permission> {
        catalogue::all()
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User administration
    // ─────────────────────────────────────────────────────────────────────────

    pub fn add_user(&mut self, data: NewUser) -> User {
        let user = self.directory.add_user(data);
        tracing::info!(user_id = %user.id, role = %user.role, "user added");
        user
    }

    /// Idempotent; returns the removed record if there was one.
    ///
    /// A removed user who is currently acting keeps their session until logout.
    pub fn remove_user(&mut self, id: UserId) -> Option<User> {
        let removed = self.directory.remove_user(id);
        if removed.is_some() {
            tracing::info!(user_id = %id, "user removed");
        }
        removed
    }

    /// Merge `patch`; the live session mirrors it when `id` is the acting user.
    pub fn update_user(
        &mut self,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<User, UserNotFoundError> {
        let user = self.directory.update_user(id, patch)?;
        self.sessions.sync_user(&user);
        Ok(user)
    }

    /// Replace one user's explicit permission list.
    pub fn set_user_permissions(
        &mut self,
        id: UserId,
        permissions: Vec<Permission>,
    ) -> Result<User, UserNotFoundError> {
        let user = self.directory.set_permissions(id, permissions)?;
        self.sessions.sync_user(&user);
        Ok(user)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Role administration
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_role(&mut self, name: &str) -> Result<Role, CreateRoleError> {
        let role = self.registry.create_role(name)?;
        tracing::info!(role = %role, "role created");
        Ok(role)
    }

    /// Users holding the role keep it; nothing is reassigned.
    pub fn delete_role(&mut self, role: &Role) -> Result<(), ProtectedRoleError> {
        self.registry.delete_role(role)?;
        let orphaned = self.directory.users_with_role(role).count();
        tracing::info!(role = %role, orphaned, "role deleted");
        Ok(())
    }

    pub fn update_roles(&mut self, roles: Vec<Role>) -> Result<(), ProtectedRoleError> {
        self.registry.replace_roles(roles)
    }

    pub fn get_role_permissions(&self, role: &Role) -> Vec<Permission> {
        self.registry.role_permissions(role, &self.directory)
    }

    /// Push `permissions` to every user holding `role`, including the acting
    /// user, whose next check sees the new set. Returns the number of
    /// directory users touched.
    pub fn update_role_permissions(&mut self, role: &Role, permissions: Vec<Permission>) -> usize {
        let permissions = dedup_permissions(permissions);
        self.registry.record_role_permissions(role, &permissions);
        let touched = self.directory.set_role_permissions(role, &permissions);
        let session_synced = self.sessions.sync_role_permissions(role, &permissions);

        tracing::info!(
            role = %role,
            permissions = permissions.len(),
            touched,
            session_synced,
            "role permissions updated"
        );
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StandardRole;
    use crate::catalogue::{inventory, users};

    fn engine() -> AccessControl {
        AccessControl::from_config(&EngineConfig::demo())
    }

    #[test]
    fn demo_registry_lists_seeded_roles() {
        let engine = engine();
        let roles = engine.available_roles();
        assert_eq!(roles[0], Role::ADMINISTRATOR);
        assert!(roles.contains(&Role::from(StandardRole::Technician)));
        assert_eq!(engine.available_permissions().len(), catalogue::ALL.len());
    }

    #[test]
    fn self_edit_is_visible_immediately() {
        let mut engine = engine();
        engine.switch_user(UserId::new(1)).unwrap();

        engine.update_user(UserId::new(1), &UserPatch::name("Jean D.")).unwrap();
        assert_eq!(engine.current_user().name, "Jean D.");

        engine
            .set_user_permissions(UserId::new(1), vec![users::VIEW])
            .unwrap();
        assert!(engine.has_permission(&users::VIEW));
        assert!(!engine.has_permission(&inventory::VIEW));
    }

    #[test]
    fn editing_someone_else_leaves_the_session_alone() {
        let mut engine = engine();
        engine.switch_user(UserId::new(1)).unwrap();
        engine.update_user(UserId::new(3), &UserPatch::name("P. Leroy")).unwrap();
        assert_eq!(engine.current_user().name, "Jean Dupont");
    }

    #[test]
    fn switch_to_unknown_user_keeps_current_session() {
        let mut engine = engine();
        engine.switch_user(UserId::new(2)).unwrap();
        assert!(engine.switch_user(UserId::new(404)).is_err());
        assert_eq!(engine.current_user().id, UserId::new(2));
        assert_eq!(engine.auth_state(), AuthState::Authenticated);
    }

    #[test]
    fn locked_down_config_has_no_demo_logins() {
        let mut engine = AccessControl::from_config(&EngineConfig::default());
        assert!(engine.available_users().is_empty());
        assert!(!engine.login_user("admin", "admin123"));

        engine
            .set_admin_credentials(&AdminCredentials::new("root", "correct horse"))
            .unwrap();
        assert!(engine.login_user("root", "correct horse"));
        assert!(engine.current_user().role.is_administrator());

        engine.clear_admin_credentials().unwrap();
        engine.logout_user();
        assert!(!engine.login_user("root", "correct horse"));
    }
}
