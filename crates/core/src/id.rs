//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a user (actor identity).
///
/// Ids are small integers assigned monotonically by the user directory
/// (`max(existing) + 1`). `UserId::ANONYMOUS` (0) is reserved for the
/// placeholder actor and is never handed out to a real user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Id carried by the anonymous placeholder session.
    pub const ANONYMOUS: UserId = UserId(0);

    /// Id carried by built-in accounts that live outside the directory
    /// (administrator override and bootstrap logins).
    pub const SYSTEM: UserId = UserId(u64::MAX);

    /// First id handed out by an empty directory.
    pub const FIRST: UserId = UserId(1);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id following this one, or `None` once the range below
    /// [`UserId::SYSTEM`] is used up.
    pub fn next(self) -> Option<Self> {
        self.0
            .checked_add(1)
            .filter(|&value| value != Self::SYSTEM.0)
            .map(Self)
    }

    pub fn is_anonymous(self) -> bool {
        self == Self::ANONYMOUS
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<UserId> for u64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u64>()
            .map_err(|e| DomainError::invalid_id(format!("UserId: {e}")))?;
        Ok(Self(value))
    }
}
