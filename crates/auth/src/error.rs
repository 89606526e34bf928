//! Failure types surfaced by the RBAC engine.
//!
//! Directory and registry errors are precise so administrative screens can
//! say what went wrong. Authentication failures are deliberately vague.

use thiserror::Error;

use gestio_core::{DomainError, UserId};

use crate::{Permission, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("role '{role}' already exists")]
pub struct DuplicateRoleError {
    pub role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("role '{role}' is protected and cannot be removed")]
pub struct ProtectedRoleError {
    pub role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("user {id} not found")]
pub struct UserNotFoundError {
    pub id: UserId,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("role name must not be empty")]
pub struct InvalidRoleName;

/// Failure to create a role.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreateRoleError {
    #[error(transparent)]
    Duplicate(#[from] DuplicateRoleError),

    #[error(transparent)]
    InvalidName(#[from] InvalidRoleName),
}

/// Login failure. Never distinguishes "unknown user" from "wrong secret".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Authorization failure for `?`-style gating.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(Permission),
}

impl From<DuplicateRoleError> for DomainError {
    fn from(value: DuplicateRoleError) -> Self {
        DomainError::conflict(value.to_string())
    }
}

impl From<ProtectedRoleError> for DomainError {
    fn from(value: ProtectedRoleError) -> Self {
        DomainError::invariant(value.to_string())
    }
}

impl From<UserNotFoundError> for DomainError {
    fn from(value: UserNotFoundError) -> Self {
        DomainError::not_found(format!("user {}", value.id))
    }
}

impl From<InvalidRoleName> for DomainError {
    fn from(value: InvalidRoleName) -> Self {
        DomainError::validation(value.to_string())
    }
}

impl From<CreateRoleError> for DomainError {
    fn from(value: CreateRoleError) -> Self {
        match value {
            CreateRoleError::Duplicate(e) => e.into(),
            CreateRoleError::InvalidName(e) => e.into(),
        }
    }
}

impl From<AuthError> for DomainError {
    fn from(_: AuthError) -> Self {
        DomainError::Unauthorized
    }
}

impl From<AuthzError> for DomainError {
    fn from(_: AuthzError) -> Self {
        DomainError::Unauthorized
    }
}
