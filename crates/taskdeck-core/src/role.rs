//! Role hierarchy and permission checks.
//!
//! Roles are totally ordered `Viewer < Editor < Owner`. Each permission names
//! the least senior role that holds it, and a role holds a permission exactly
//! when it is at least that senior. The permission table is therefore derived
//! from the ordering, so a more senior role can never lose a permission held
//! by a junior one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A member's role on a board. Declaration order is seniority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
    Owner,
}

impl Role {
    /// Every role, least senior first.
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Editor, Role::Owner];

    /// Parse a wire value. Matching is exact and case-sensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "viewer" => Some(Self::Viewer),
            "editor" => Some(Self::Editor),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Owner => "owner",
        }
    }

    /// Is this role at least as senior as `other`?
    pub fn at_least(self, other: Role) -> bool {
        self >= other
    }

    pub fn has_permission(self, permission: Permission) -> bool {
        self.at_least(permission.minimum_role())
    }

    /// The permissions this role holds, in [`Permission::ALL`] order.
    pub fn permissions(self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.has_permission(*p))
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action on a board's tasks or collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Create,
    Edit,
    View,
    Delete,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Create,
        Permission::Edit,
        Permission::View,
        Permission::Delete,
    ];

    /// The least senior role granted this permission.
    pub fn minimum_role(self) -> Role {
        match self {
            Self::View => Role::Viewer,
            Self::Create | Self::Edit => Role::Editor,
            Self::Delete => Role::Owner,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::View => "view",
            Self::Delete => "delete",
        }
    }
}

/// What a caller must hold: a named permission, or a minimum role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Permission(Permission),
    MinimumRole(Role),
}

impl Requirement {
    pub fn is_met_by(self, role: Role) -> bool {
        match self {
            Self::Permission(p) => role.has_permission(p),
            Self::MinimumRole(min) => role.at_least(min),
        }
    }
}

impl From<Permission> for Requirement {
    fn from(permission: Permission) -> Self {
        Self::Permission(permission)
    }
}

impl From<Role> for Requirement {
    fn from(role: Role) -> Self {
        Self::MinimumRole(role)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permission(p) => write!(f, "permission '{}'", p.as_str()),
            Self::MinimumRole(r) => write!(f, "role '{}' or higher", r),
        }
    }
}

/// Does a stored role string satisfy `requirement`?
///
/// Unrecognized role strings never satisfy anything.
pub fn satisfies(role: &str, requirement: impl Into<Requirement>) -> bool {
    let requirement = requirement.into();
    Role::parse(role).is_some_and(|r| requirement.is_met_by(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Role::Viewer < Role::Editor);
        assert!(Role::Editor < Role::Owner);
        assert!(Role::Owner.at_least(Role::Owner));
        assert!(!Role::Viewer.at_least(Role::Editor));
    }

    #[test]
    fn test_permission_table() {
        assert_eq!(Role::Owner.permissions(), Permission::ALL.to_vec());
        assert_eq!(
            Role::Editor.permissions(),
            vec![Permission::Create, Permission::Edit, Permission::View]
        );
        assert_eq!(Role::Viewer.permissions(), vec![Permission::View]);
    }

    #[test]
    fn test_permissions_monotonic_in_seniority() {
        for low in Role::ALL {
            for high in Role::ALL.into_iter().filter(|r| *r >= low) {
                for p in low.permissions() {
                    assert!(
                        high.has_permission(p),
                        "{high} lacks {p:?} although {low} has it"
                    );
                }
            }
        }
    }

    #[test]
    fn test_unknown_roles_deny() {
        for bogus in ["", "admin", "Owner", "OWNER", " owner", "collaborator"] {
            for p in Permission::ALL {
                assert!(!satisfies(bogus, p), "{bogus:?} satisfied {p:?}");
            }
            assert!(!satisfies(bogus, Role::Viewer));
        }
    }

    #[test]
    fn test_satisfies_both_query_shapes() {
        assert!(satisfies("editor", Permission::Edit));
        assert!(!satisfies("editor", Permission::Delete));
        assert!(satisfies("owner", Permission::Delete));
        assert!(satisfies("editor", Role::Viewer));
        assert!(satisfies("editor", Role::Editor));
        assert!(!satisfies("viewer", Role::Editor));
    }

    #[test]
    fn test_wire_values() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert!(serde_json::from_str::<Role>("\"Editor\"").is_err());
    }
}
