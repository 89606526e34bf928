//! The dynamic list of roles defined in the system.

use std::collections::HashMap;

use crate::directory::UserDirectory;
use crate::error::{CreateRoleError, DuplicateRoleError, InvalidRoleName, ProtectedRoleError};
use crate::permissions::dedup_permissions;
use crate::{Permission, Role};

/// Role registry: built-ins seen among users plus operator-created roles.
///
/// # Invariants
/// - Administrator is always listed and can never be removed.
/// - Names are unique (exact, case-sensitive match).
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: Vec<Role>,
    /// Permission sets pushed through `update_role_permissions`, which take
    /// precedence over static defaults when the role is looked up again.
    edited: HashMap<Role, Vec<Permission>>,
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self {
            roles: vec![Role::ADMINISTRATOR],
            edited: HashMap::new(),
        }
    }
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the initial role list from the distinct roles held by `directory`.
    pub fn from_directory(directory: &UserDirectory) -> Self {
        let mut registry = Self::new();
        for role in directory.distinct_roles() {
            if !registry.contains(&role) {
                registry.roles.push(role);
            }
        }
        registry
    }

    pub fn list_roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Append a new role. Does not create or touch any user.
    pub fn create_role(&mut self, name: &str) -> Result<Role, CreateRoleError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InvalidRoleName.into());
        }

        let role = Role::parse(name);
        if self.contains(&role) {
            return Err(DuplicateRoleError { role }.into());
        }

        self.roles.push(role.clone());
        Ok(role)
    }

    /// Remove a role from the registry.
    ///
    /// Users still holding the role keep it (orphaned); nothing is reassigned.
    /// Removing a role that is not listed is a no-op.
    pub fn delete_role(&mut self, role: &Role) -> Result<(), ProtectedRoleError> {
        if role.is_protected() {
            return Err(ProtectedRoleError { role: role.clone() });
        }
        self.roles.retain(|r| r != role);
        self.edited.remove(role);
        Ok(())
    }

    /// Replace the whole role list (administrative bulk edit).
    ///
    /// Duplicates are collapsed. The list must still contain Administrator.
    pub fn replace_roles(&mut self, roles: Vec<Role>) -> Result<(), ProtectedRoleError> {
        if !roles.iter().any(Role::is_protected) {
            return Err(ProtectedRoleError { role: Role::ADMINISTRATOR });
        }

        let mut next: Vec<Role> = Vec::with_capacity(roles.len());
        for role in roles {
            if !next.contains(&role) {
                next.push(role);
            }
        }
        self.edited.retain(|role, _| next.contains(role));
        self.roles = next;
        Ok(())
    }

    /// Permissions a role currently stands for.
    ///
    /// Resolution order: the last set pushed through
    /// [`record_role_permissions`](Self::record_role_permissions), the static
    /// default of a standard role, the list of the first user holding the role,
    /// and finally the empty set.
    pub fn role_permissions(&self, role: &Role, directory: &UserDirectory) -> Vec<Permission> {
        if let Some(edited) = self.edited.get(role) {
            return edited.clone();
        }
        if let Some(defaults) = role.default_permissions() {
            return defaults;
        }
        directory
            .users_with_role(role)
            .next()
            .map(|u| u.permissions.clone())
            .unwrap_or_default()
    }

    /// Remember the set last assigned to `role` through a bulk edit.
    pub fn record_role_permissions(&mut self, role: &Role, permissions: &[Permission]) {
        self.edited
            .insert(role.clone(), dedup_permissions(permissions.iter().cloned()));
    }
}
