//! User identity records held by the directory.

use serde::{Deserialize, Serialize};

use gestio_core::{Entity, UserId};

use crate::permissions::dedup_permissions;
use crate::{Permission, Role};

/// A known identity.
///
/// # Invariants
/// - `id` is unique within the directory and never reused while the user exists.
/// - `permissions` is the authoritative set for this user's checks unless the
///   role is Administrator. It starts as a copy and is edited independently of
///   the role's defaults (bulk role edits overwrite it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl User {
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        role: Role,
        permissions: Vec<Permission>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            permissions: dedup_permissions(permissions),
        }
    }

    /// The placeholder identity carried by an unauthenticated session.
    pub fn anonymous() -> Self {
        Self {
            id: UserId::ANONYMOUS,
            name: "Guest".to_string(),
            role: Role::Custom("Guest".to_string()),
            permissions: Vec::new(),
        }
    }

    pub fn holds(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Merge a patch into this record (absent fields are left untouched).
    pub fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(role) = &patch.role {
            self.role = role.clone();
        }
    }

    pub fn set_permissions(&mut self, permissions: Vec<Permission>) {
        self.permissions = dedup_permissions(permissions);
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Input for `add_user`; the directory assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl NewUser {
    /// A new user starting from the role's default permissions (empty for custom roles).
    pub fn with_role_defaults(name: impl Into<String>, role: Role) -> Self {
        let permissions = role.default_permissions().unwrap_or_default();
        Self {
            name: name.into(),
            role,
            permissions,
        }
    }
}

/// Partial update for `update_user`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            role: None,
        }
    }

    pub fn role(role: Role) -> Self {
        Self {
            name: None,
            role: Some(role),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none()
    }
}
