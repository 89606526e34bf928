//! The set of known identities.

use std::collections::HashSet;

use gestio_core::UserId;

use crate::error::UserNotFoundError;
use crate::user::{NewUser, User, UserPatch};
use crate::{Permission, Role};

/// In-memory user directory.
///
/// Users and roles are managed independently: a user may reference a role
/// the registry does not (yet, or any longer) know about.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from seed records. Later duplicates of an id are dropped.
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        let mut directory = Self::new();
        for user in users {
            if directory.get(user.id).is_none() {
                directory.users.push(user);
            }
        }
        directory
    }

    pub fn list(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Get a user by display name (trimmed, case-insensitive, linear scan).
    pub fn find_by_name(&self, name: &str) -> Option<&User> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.users.iter().find(|u| u.name.trim().to_lowercase() == needle)
    }

    pub fn users_with_role<'a>(&'a self, role: &'a Role) -> impl Iterator<Item = &'a User> + 'a {
        self.users.iter().filter(move |u| &u.role == role)
    }

    /// Distinct roles held by users, in first-seen order.
    pub fn distinct_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = Vec::new();
        for user in &self.users {
            if !roles.contains(&user.role) {
                roles.push(user.role.clone());
            }
        }
        roles
    }

    /// `max(existing ids) + 1`, or `1` for an empty directory.
    pub fn next_id(&self) -> UserId {
        let max = self
            .users
            .iter()
            .map(|u| u.id)
            .filter(|id| *id != UserId::SYSTEM)
            .max();
        match max {
            None => UserId::FIRST,
            Some(max) => max.next().unwrap_or_else(|| self.lowest_free_id()),
        }
    }

    /// Smallest unused id; only reached once the top of the range is taken.
    fn lowest_free_id(&self) -> UserId {
        let taken: HashSet<UserId> = self.users.iter().map(|u| u.id).collect();
        (UserId::FIRST.get()..UserId::SYSTEM.get())
            .map(UserId::new)
            .find(|id| !taken.contains(id))
            .unwrap_or(UserId::FIRST)
    }

    pub fn add_user(&mut self, data: NewUser) -> User {
        let user = User::new(self.next_id(), data.name, data.role, data.permissions);
        self.users.push(user.clone());
        user
    }

    /// Remove a user. Removing an unknown id is a no-op and returns `None`.
    pub fn remove_user(&mut self, id: UserId) -> Option<User> {
        let index = self.users.iter().position(|u| u.id == id)?;
        Some(self.users.remove(index))
    }

    /// Merge `patch` into the user and return the updated record.
    pub fn update_user(
        &mut self,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<User, UserNotFoundError> {
        let user = self.get_mut(id)?;
        user.apply_patch(patch);
        Ok(user.clone())
    }

    /// Replace one user's explicit permission list.
    pub fn set_permissions(
        &mut self,
        id: UserId,
        permissions: Vec<Permission>,
    ) -> Result<User, UserNotFoundError> {
        let user = self.get_mut(id)?;
        user.set_permissions(permissions);
        Ok(user.clone())
    }

    /// Overwrite the permission list of every user holding `role`.
    ///
    /// Returns the number of users touched.
    pub fn set_role_permissions(&mut self, role: &Role, permissions: &[Permission]) -> usize {
        let mut touched = 0;
        for user in self.users.iter_mut().filter(|u| &u.role == role) {
            user.set_permissions(permissions.to_vec());
            touched += 1;
        }
        touched
    }

    fn get_mut(&mut self, id: UserId) -> Result<&mut User, UserNotFoundError> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(UserNotFoundError { id })
    }
}
