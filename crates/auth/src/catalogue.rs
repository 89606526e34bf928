//! The closed catalogue of permissions, grouped by feature module.
//!
//! Feature modules refer to these constants rather than spelling tokens by
//! hand, so a typo is a compile error instead of a silently denied check.

use std::collections::BTreeMap;

use crate::Permission;

/// Revision of the catalogue below. Bump when tokens are added or removed.
pub const CATALOGUE_VERSION: u32 = 1;

pub mod inventory {
    use crate::Permission;

    pub const VIEW: Permission = Permission::from_static("inventory.view");
    pub const CREATE: Permission = Permission::from_static("inventory.create");
    pub const EDIT: Permission = Permission::from_static("inventory.edit");
    pub const DELETE: Permission = Permission::from_static("inventory.delete");
}

pub mod projects {
    use crate::Permission;

    pub const VIEW: Permission = Permission::from_static("projects.view");
    pub const CREATE: Permission = Permission::from_static("projects.create");
    pub const EDIT: Permission = Permission::from_static("projects.edit");
    pub const DELETE: Permission = Permission::from_static("projects.delete");
}

pub mod quotes {
    use crate::Permission;

    pub const VIEW: Permission = Permission::from_static("quotes.view");
    pub const CREATE: Permission = Permission::from_static("quotes.create");
    pub const EDIT: Permission = Permission::from_static("quotes.edit");
    pub const DELETE: Permission = Permission::from_static("quotes.delete");
    pub const APPROVE: Permission = Permission::from_static("quotes.approve");
}

pub mod hr {
    use crate::Permission;

    pub const VIEW: Permission = Permission::from_static("hr.view");
    pub const CREATE: Permission = Permission::from_static("hr.create");
    pub const EDIT: Permission = Permission::from_static("hr.edit");
    pub const DELETE: Permission = Permission::from_static("hr.delete");
}

pub mod suppliers {
    use crate::Permission;

    pub const VIEW: Permission = Permission::from_static("suppliers.view");
    pub const CREATE: Permission = Permission::from_static("suppliers.create");
    pub const EDIT: Permission = Permission::from_static("suppliers.edit");
    pub const DELETE: Permission = Permission::from_static("suppliers.delete");
}

pub mod settings {
    use crate::Permission;

    pub const VIEW: Permission = Permission::from_static("settings.view");
    pub const EDIT: Permission = Permission::from_static("settings.edit");
}

pub mod users {
    use crate::Permission;

    pub const VIEW: Permission = Permission::from_static("users.view");
    pub const MANAGE: Permission = Permission::from_static("users.manage");
}

/// Every valid permission, in display order (grouped by module).
pub const ALL: &[Permission] = &[
    inventory::VIEW,
    inventory::CREATE,
    inventory::EDIT,
    inventory::DELETE,
    projects::VIEW,
    projects::CREATE,
    projects::EDIT,
    projects::DELETE,
    quotes::VIEW,
    quotes::CREATE,
    quotes::EDIT,
    quotes::DELETE,
    quotes::APPROVE,
    hr::VIEW,
    hr::CREATE,
    hr::EDIT,
    hr::DELETE,
    suppliers::VIEW,
    suppliers::CREATE,
    suppliers::EDIT,
    suppliers::DELETE,
    settings::VIEW,
    settings::EDIT,
    users::VIEW,
    users::MANAGE,
];

/// Ordered, deduplicated list of all permissions.
pub fn all() -> Vec<Permission> {
    ALL.to_vec()
}

pub fn contains(permission: &Permission) -> bool {
    ALL.iter().any(|p| p == permission)
}

/// Look a token up by its string form.
pub fn lookup(token: &str) -> Option<Permission> {
    ALL.iter().find(|p| p.as_str() == token).cloned()
}

/// Catalogue grouped by module prefix (for permission-matrix screens).
pub fn by_module() -> BTreeMap<String, Vec<Permission>> {
    let mut groups: BTreeMap<String, Vec<Permission>> = BTreeMap::new();
    for permission in ALL {
        groups
            .entry(permission.module().to_string())
            .or_default()
            .push(permission.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalogue_is_deduplicated() {
        let unique: HashSet<&str> = ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(unique.len(), ALL.len());
    }

    #[test]
    fn every_token_is_module_dot_action() {
        for p in ALL {
            assert!(p.action().is_some(), "{p} has no action part");
            assert!(!p.module().is_empty());
        }
    }

    #[test]
    fn grouping_covers_every_token() {
        let groups = by_module();
        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, ALL.len());
        assert_eq!(groups.len(), 7);
        assert_eq!(groups["quotes"].len(), 5);
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(lookup("hr.edit"), Some(hr::EDIT));
        assert_eq!(lookup("HR.edit"), None);
        assert!(!contains(&Permission::new("inventory.purge")));
    }
}
