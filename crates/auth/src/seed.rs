//! Demo directory shipped with demo builds.

use gestio_core::UserId;

use crate::catalogue::inventory;
use crate::{Role, StandardRole, User};

fn with_defaults(id: u64, name: &str, role: StandardRole) -> User {
    User::new(UserId::new(id), name, Role::from(role), role.default_permissions())
}

/// Seed users for demo builds.
pub fn demo_users() -> Vec<User> {
    vec![
        User::new(
            UserId::new(1),
            "Jean Dupont",
            Role::from(StandardRole::Technician),
            vec![inventory::VIEW],
        ),
        with_defaults(2, "Sophie Martin", StandardRole::Administrator),
        with_defaults(3, "Pierre Leroy", StandardRole::ProjectManager),
        with_defaults(4, "Camille Bernard", StandardRole::Salesperson),
        with_defaults(5, "Lucas Moreau", StandardRole::Accountant),
        with_defaults(6, "Emma Petit", StandardRole::HumanResources),
    ]
}
