//! Entity trait: identity that survives edits to every other field.

/// Anything addressed by a stable identifier (users, for instance, keep their
/// id across renames and role changes).
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;
}
