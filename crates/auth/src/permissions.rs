use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission token of the form `"<module>.<action>"` (e.g. `"inventory.delete"`).
///
/// Permissions are opaque strings at the type level; the closed set of valid
/// tokens lives in [`crate::catalogue`]. A token outside the catalogue can
/// still be constructed (it may come from storage or a caller) but every
/// check against it is denied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Const constructor used by the catalogue.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Module prefix (`"inventory"` for `"inventory.delete"`).
    pub fn module(&self) -> &str {
        match self.0.split_once('.') {
            Some((module, _)) => module,
            None => &self.0,
        }
    }

    /// Action suffix (`"delete"` for `"inventory.delete"`), if any.
    pub fn action(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, action)| action)
    }

    /// Whether this token is part of the catalogue.
    pub fn is_known(&self) -> bool {
        crate::catalogue::contains(self)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Deduplicate a permission list, keeping the first occurrence of each token.
pub fn dedup_permissions(permissions: impl IntoIterator<Item = Permission>) -> Vec<Permission> {
    let mut out: Vec<Permission> = Vec::new();
    for permission in permissions {
        if !out.contains(&permission) {
            out.push(permission);
        }
    }
    out
}
