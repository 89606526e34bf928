//! Authorization evaluator: the only permission gate feature modules use.
//!
//! - No IO
//! - No panics
//! - Fail-closed: anonymous sessions and tokens outside the catalogue are denied

use serde::Serialize;

use crate::error::AuthzError;
use crate::session::Session;
use crate::{Permission, Role};

/// `true` iff the session may exercise `permission`.
///
/// Denied when unauthenticated or when the token is not in the catalogue;
/// granted for Administrator; otherwise decided by the user's explicit list.
pub fn has_permission(session: &Session, permission: &Permission) -> bool {
    if !session.is_authenticated || !permission.is_known() {
        return false;
    }
    session.user.role.is_administrator() || session.user.holds(permission)
}

/// `true` iff every permission in `permissions` is granted.
///
/// An empty list is granted to any authenticated session.
pub fn has_all_permissions(session: &Session, permissions: &[Permission]) -> bool {
    session.is_authenticated && permissions.iter().all(|p| has_permission(session, p))
}

/// `true` iff at least one permission in `permissions` is granted.
///
/// Administrator is granted outright, including for an empty list, unless a
/// listed token is outside the catalogue.
pub fn has_any_permission(session: &Session, permissions: &[Permission]) -> bool {
    if !session.is_authenticated {
        return false;
    }
    if session.user.role.is_administrator() {
        return permissions.iter().all(Permission::is_known);
    }
    permissions.iter().any(|p| has_permission(session, p))
}

/// `Result` form of [`has_permission`] for `?`-style gating.
pub fn authorize(session: &Session, required: &Permission) -> Result<(), AuthzError> {
    if !session.is_authenticated {
        return Err(AuthzError::NotAuthenticated);
    }
    if has_permission(session, required) {
        Ok(())
    } else {
        tracing::debug!(user_id = %session.user.id, permission = %required, "permission denied");
        Err(AuthzError::Forbidden(required.clone()))
    }
}

/// Command-side authorization contract.
///
/// Implement this on feature commands that require permissions; callers run
/// [`authorize_command`] before executing them.
pub trait RequiresPermissions {
    fn required_permissions(&self) -> &[Permission];
}

/// Check every permission a command declares, reporting the first missing one.
pub fn authorize_command<C>(session: &Session, command: &C) -> Result<(), AuthzError>
where
    C: RequiresPermissions + ?Sized,
{
    command
        .required_permissions()
        .iter()
        .try_for_each(|p| authorize(session, p))
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why a check came out the way it did (for admin/debug screens).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    pub granted: bool,
    pub reason: String,
    pub grant: Option<GrantKind>,
    pub denial: Option<DenialKind>,
    pub role: String,
    pub effective_permissions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    AdministratorOverride,
    ExplicitPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NotAuthenticated,
    UnknownPermission,
    MissingPermission,
}

/// Explain the decision [`has_permission`] makes for `required`.
pub fn explain_authorization(session: &Session, required: &Permission) -> AuthorizationExplanation {
    let role: &Role = &session.user.role;
    let mut effective: Vec<String> =
        session.user.permissions.iter().map(|p| p.to_string()).collect();
    effective.sort();

    let (grant, denial, reason) = if !session.is_authenticated {
        (None, Some(DenialKind::NotAuthenticated), "no authenticated user".to_string())
    } else if !required.is_known() {
        (
            None,
            Some(DenialKind::UnknownPermission),
            format!("'{required}' is not a known permission"),
        )
    } else if role.is_administrator() {
        (
            Some(GrantKind::AdministratorOverride),
            None,
            format!("role '{role}' holds every permission"),
        )
    } else if session.user.holds(required) {
        (
            Some(GrantKind::ExplicitPermission),
            None,
            format!("user '{}' holds '{required}'", session.user.name),
        )
    } else {
        (
            None,
            Some(DenialKind::MissingPermission),
            format!("user '{}' does not hold '{required}'", session.user.name),
        )
    };

    AuthorizationExplanation {
        required_permission: required.to_string(),
        granted: grant.is_some(),
        reason,
        grant,
        denial,
        role: role.to_string(),
        effective_permissions: effective,
    }
}
