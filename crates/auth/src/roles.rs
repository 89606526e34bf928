use serde::{Deserialize, Serialize};

use crate::Permission;
use crate::catalogue::{self, hr, inventory, projects, quotes, settings, suppliers, users};

/// Built-in roles shipped with the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardRole {
    Administrator,
    Manager,
    ProjectManager,
    Technician,
    Salesperson,
    Accountant,
    HumanResources,
    Viewer,
}

impl StandardRole {
    pub const ALL: [StandardRole; 8] = [
        StandardRole::Administrator,
        StandardRole::Manager,
        StandardRole::ProjectManager,
        StandardRole::Technician,
        StandardRole::Salesperson,
        StandardRole::Accountant,
        StandardRole::HumanResources,
        StandardRole::Viewer,
    ];

    /// Display name, which is also the persisted form.
    pub fn as_str(&self) -> &'static str {
        match self {
            StandardRole::Administrator => "Administrator",
            StandardRole::Manager => "Manager",
            StandardRole::ProjectManager => "Project Manager",
            StandardRole::Technician => "Technician",
            StandardRole::Salesperson => "Salesperson",
            StandardRole::Accountant => "Accountant",
            StandardRole::HumanResources => "HR Manager",
            StandardRole::Viewer => "Viewer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }

    /// Static default permission set granted when a user is created with this role.
    pub fn default_permissions(&self) -> Vec<Permission> {
        match self {
            StandardRole::Administrator => catalogue::all(),
            StandardRole::Manager => vec![
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
                suppliers::VIEW,
                suppliers::CREATE,
                suppliers::EDIT,
                hr::VIEW,
                settings::VIEW,
                users::VIEW,
            ],
            StandardRole::ProjectManager => vec![
                projects::VIEW,
                projects::CREATE,
                projects::EDIT,
                quotes::VIEW,
                quotes::CREATE,
                quotes::EDIT,
                inventory::VIEW,
                suppliers::VIEW,
            ],
            StandardRole::Technician => vec![inventory::VIEW, inventory::EDIT, projects::VIEW],
            StandardRole::Salesperson => vec![
                quotes::VIEW,
                quotes::CREATE,
                quotes::EDIT,
                projects::VIEW,
                inventory::VIEW,
            ],
            StandardRole::Accountant => vec![
                quotes::VIEW,
                quotes::APPROVE,
                suppliers::VIEW,
                suppliers::EDIT,
                projects::VIEW,
            ],
            StandardRole::HumanResources => {
                vec![hr::VIEW, hr::CREATE, hr::EDIT, hr::DELETE, users::VIEW]
            }
            StandardRole::Viewer => {
                vec![inventory::VIEW, projects::VIEW, quotes::VIEW, suppliers::VIEW]
            }
        }
    }
}

impl core::fmt::Display for StandardRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role identifier used for RBAC.
///
/// A role is either one of the [`StandardRole`]s or an operator-defined name.
/// Parsing a string that spells a standard role always yields the standard
/// variant, so `"Administrator"` can never sneak in as a custom role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Standard(StandardRole),
    Custom(String),
}

impl Role {
    pub const ADMINISTRATOR: Role = Role::Standard(StandardRole::Administrator);

    /// Parse a role name (exact, case-sensitive match for standard roles).
    pub fn parse(name: &str) -> Self {
        match StandardRole::from_name(name) {
            Some(standard) => Role::Standard(standard),
            None => Role::Custom(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Standard(standard) => standard.as_str(),
            Role::Custom(name) => name,
        }
    }

    /// The Administrator override: this role passes every catalogue check
    /// whatever its stored permission list says.
    pub fn is_administrator(&self) -> bool {
        matches!(self, Role::Standard(StandardRole::Administrator))
    }

    /// Administrator can never be removed from the registry.
    pub fn is_protected(&self) -> bool {
        self.is_administrator()
    }

    pub fn standard(&self) -> Option<StandardRole> {
        match self {
            Role::Standard(standard) => Some(*standard),
            Role::Custom(_) => None,
        }
    }

    /// Static default permissions, `None` for custom roles.
    pub fn default_permissions(&self) -> Option<Vec<Permission>> {
        self.standard().map(|s| s.default_permissions())
    }
}

impl From<StandardRole> for Role {
    fn from(value: StandardRole) -> Self {
        Role::Standard(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match StandardRole::from_name(&value) {
            Some(standard) => Role::Standard(standard),
            None => Role::Custom(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::parse(value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Standard(standard) => standard.as_str().to_string(),
            Role::Custom(name) => name,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
