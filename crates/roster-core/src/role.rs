//! The class role hierarchy.
//!
//! Every role comparison in the workspace goes through this module. [`Role`]
//! intentionally does not implement `PartialOrd`/`Ord`: callers must use
//! [`Role::compare`], [`Role::at_least`] or [`Role::outranks`] so that the
//! strict/non-strict distinction is always spelled out at the call site.
//!
//! ```text
//! Owner (2)
//!   ↑ handoff only
//! Administrator (1)
//!   ↑ set-role
//! Student (0)
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A member's role within a single class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Administrator,
    Owner,
}

/// Returned when a stored role ordinal is outside the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    #[error("unknown role ordinal {0}")]
    Ordinal(i16),
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Administrator, Role::Owner];

    const fn rank(self) -> i16 {
        match self {
            Role::Student => 0,
            Role::Administrator => 1,
            Role::Owner => 2,
        }
    }

    /// Orders two roles by their position in the hierarchy.
    pub fn compare(self, other: Role) -> Ordering {
        self.rank().cmp(&other.rank())
    }

    /// `true` when `self` is `threshold` or higher.
    pub fn at_least(self, threshold: Role) -> bool {
        self.compare(threshold) != Ordering::Less
    }

    /// `true` when `self` is strictly higher than `other`.
    pub fn outranks(self, other: Role) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// Ordinal used by the persisted `members.role` column.
    pub const fn ordinal(self) -> i16 {
        self.rank()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Administrator => "administrator",
            Role::Owner => "owner",
        }
    }
}

impl TryFrom<i16> for Role {
    type Error = RoleError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::Student),
            1 => Ok(Role::Administrator),
            2 => Ok(Role::Owner),
            other => Err(RoleError::Ordinal(other)),
        }
    }
}

impl From<Role> for i16 {
    fn from(role: Role) -> i16 {
        role.ordinal()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_follows_hierarchy() {
        assert_eq!(Role::Student.compare(Role::Administrator), Ordering::Less);
        assert_eq!(Role::Owner.compare(Role::Administrator), Ordering::Greater);
        assert_eq!(Role::Administrator.compare(Role::Administrator), Ordering::Equal);
    }

    #[test]
    fn test_at_least_is_inclusive() {
        assert!(Role::Administrator.at_least(Role::Administrator));
        assert!(Role::Owner.at_least(Role::Administrator));
        assert!(!Role::Student.at_least(Role::Administrator));
    }

    #[test]
    fn test_outranks_is_strict() {
        for role in Role::ALL {
            assert!(!role.outranks(role), "{role} must not outrank itself");
        }
        assert!(Role::Owner.outranks(Role::Administrator));
        assert!(Role::Administrator.outranks(Role::Student));
        assert!(!Role::Student.outranks(Role::Owner));
    }

    #[test]
    fn test_ordinal_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::try_from(role.ordinal()).unwrap(), role);
        }
        assert_eq!(Role::try_from(7i16), Err(RoleError::Ordinal(7)));
    }

    #[test]
    fn test_serde_and_display_agree() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
        }
        let role: Role = serde_json::from_str(r#""student""#).unwrap();
        assert_eq!(role, Role::Student);
        assert!(serde_json::from_str::<Role>(r#""admin""#).is_err());
    }
}
