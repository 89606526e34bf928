//! `gestio-auth` — role-based access control and session engine.
//!
//! Every feature module (inventory, projects, quotes, HR, suppliers) asks this
//! crate who is acting and whether they may do something. The crate is
//! decoupled from UI and transport; persistence goes through the
//! [`SessionStorage`] trait.

pub mod access;
pub mod authenticator;
pub mod authorize;
pub mod catalogue;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod permissions;
pub mod registry;
pub mod roles;
pub mod seed;
pub mod session;
pub mod storage;
pub mod user;

pub use access::{AccessControl, CurrentUser};
pub use authenticator::{AuthState, Authenticator};
pub use authorize::{
    AuthorizationExplanation, RequiresPermissions, authorize, authorize_command,
    explain_authorization, has_all_permissions, has_any_permission, has_permission,
};
pub use config::EngineConfig;
pub use credentials::{
    AdminCredentials, BootstrapAccount, BootstrapCredentials, CredentialResolver,
    DirectoryCredentials, ResolverError, StoredAdminCredentials,
};
pub use directory::UserDirectory;
pub use error::{
    AuthError, AuthzError, CreateRoleError, DuplicateRoleError, InvalidRoleName,
    ProtectedRoleError, UserNotFoundError,
};
pub use permissions::Permission;
pub use registry::RoleRegistry;
pub use roles::{Role, StandardRole};
pub use session::{Session, SessionEvent, SessionStore, SessionSubscription};
pub use storage::{FileStorage, InMemoryStorage, SessionStorage};
pub use user::{NewUser, User, UserPatch};

pub use gestio_core::UserId;
