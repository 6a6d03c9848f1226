//! # Roles and the Role Normalizer
//!
//! The tracker has four roles: Engineer, Manager, Lead, Admin. A user
//! holds a non-empty set of them through a many-to-many membership.
//!
//! ## The normalization boundary
//!
//! Historically, caller roles arrived in several shapes: an array of
//! strings, a single string, a comma-delimited string, or nothing at all.
//! `RoleSet::normalize` is the single place that resolves those shapes.
//! Every authorization boundary consumes a `RoleSet`; an unnormalized
//! value must never degrade a multi-role caller into a single-role caller.
//!
//! Entries that are not one of the four role names are dropped here. An
//! unknown name can never grant anything, and carrying it forward would
//! reintroduce the string-typed role unions this type exists to remove.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

// ─── Role ────────────────────────────────────────────────────────────

/// A user role. The set a caller holds decides which mutations are open
/// to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Baseline role: works defects, comments, uploads evidence.
    Engineer,
    /// Moderator role: triages, closes, deletes, exports.
    Manager,
    /// Moderator role with limited user administration.
    Lead,
    /// Full administration.
    Admin,
}

impl Role {
    /// All four roles in canonical order.
    pub fn all() -> &'static [Role] {
        &[Self::Engineer, Self::Manager, Self::Lead, Self::Admin]
    }

    /// The wire name for this role. Matches the serde representation and
    /// the values stored in the roles table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Engineer => "Engineer",
            Self::Manager => "Manager",
            Self::Lead => "Lead",
            Self::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    /// Parse a role from its wire name. Case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Engineer" => Ok(Self::Engineer),
            "Manager" => Ok(Self::Manager),
            "Lead" => Ok(Self::Lead),
            "Admin" => Ok(Self::Admin),
            other => Err(Error::Validation(format!("unknown role: {other:?}"))),
        }
    }
}

// ─── Raw role input ──────────────────────────────────────────────────

/// The loosely shaped role input accepted at ingress boundaries.
///
/// Deserializes from `null`, a single string, or an array. Anything else
/// in an array position is ignored during normalization rather than
/// failing the whole request; the caller's effective rights only ever
/// shrink from dropped entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRoles {
    /// Absent or explicit null.
    Absent,
    /// A single role name, optionally comma-delimited.
    One(String),
    /// An array of values, filtered to non-empty strings.
    Many(Vec<serde_json::Value>),
}

impl Default for RawRoles {
    fn default() -> Self {
        Self::Absent
    }
}

// ─── RoleSet ─────────────────────────────────────────────────────────

/// A deduplicated, insertion-ordered set of roles.
///
/// Small enough that a `Vec` beats a hash set; iteration order is the
/// order roles were first seen, which keeps rendered role lists stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    /// The empty set. Authorizes nothing.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a set from roles, deduplicating while preserving first-seen
    /// order.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut set = Self::empty();
        for role in roles {
            set.insert(role);
        }
        set
    }

    /// Normalize loosely shaped role input into a validated set.
    ///
    /// - an array is filtered to non-empty string entries;
    /// - a single string is split on commas and trimmed;
    /// - absent input yields the empty set, never a default role;
    /// - unknown names are dropped.
    ///
    /// Never fails and never panics.
    pub fn normalize(raw: &RawRoles) -> Self {
        let mut set = Self::empty();
        match raw {
            RawRoles::Absent => {}
            RawRoles::One(s) => {
                for part in s.split(',') {
                    set.insert_name(part.trim());
                }
            }
            RawRoles::Many(values) => {
                for value in values {
                    if let serde_json::Value::String(s) = value {
                        set.insert_name(s.trim());
                    }
                }
            }
        }
        set
    }

    fn insert_name(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        if let Ok(role) = Role::from_str(name) {
            self.insert(role);
        }
    }

    fn insert(&mut self, role: Role) {
        if !self.0.contains(&role) {
            self.0.push(role);
        }
    }

    /// Whether the set holds the given role.
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether the set holds at least one of the given roles.
    pub fn contains_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.contains(*r))
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct roles held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate the roles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// The wire names of the held roles, in insertion order.
    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(Role::as_str).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<&[Role]> for RoleSet {
    fn from(roles: &[Role]) -> Self {
        Self::new(roles.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn many(names: &[&str]) -> RawRoles {
        RawRoles::Many(
            names
                .iter()
                .map(|n| serde_json::Value::String(n.to_string()))
                .collect(),
        )
    }

    // ── Normalization shapes ─────────────────────────────────────────

    #[test]
    fn test_single_string_equals_singleton_array() {
        let from_string = RoleSet::normalize(&RawRoles::One("Admin".to_string()));
        let from_array = RoleSet::normalize(&many(&["Admin"]));
        assert_eq!(from_string, from_array);
        assert_eq!(from_string.names(), vec!["Admin"]);
    }

    #[test]
    fn test_absent_yields_empty() {
        let set = RoleSet::normalize(&RawRoles::Absent);
        assert!(set.is_empty());
        assert_eq!(set.names(), Vec::<&str>::new());
    }

    #[test]
    fn test_duplicates_collapse() {
        let set = RoleSet::normalize(&many(&["Admin", "Admin"]));
        assert_eq!(set.names(), vec!["Admin"]);
    }

    #[test]
    fn test_comma_delimited_string() {
        let set = RoleSet::normalize(&RawRoles::One("Engineer, Manager".to_string()));
        assert_eq!(set.names(), vec!["Engineer", "Manager"]);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let set = RoleSet::normalize(&many(&["Lead", "Engineer", "Lead"]));
        assert_eq!(set.names(), vec!["Lead", "Engineer"]);
    }

    #[test]
    fn test_non_string_entries_dropped() {
        let raw = RawRoles::Many(vec![
            serde_json::Value::String("Manager".to_string()),
            serde_json::Value::Null,
            serde_json::Value::Number(7.into()),
            serde_json::Value::String("".to_string()),
        ]);
        assert_eq!(RoleSet::normalize(&raw).names(), vec!["Manager"]);
    }

    #[test]
    fn test_unknown_names_dropped() {
        let set = RoleSet::normalize(&many(&["Superuser", "Engineer"]));
        assert_eq!(set.names(), vec!["Engineer"]);
    }

    #[test]
    fn test_empty_string_yields_empty() {
        assert!(RoleSet::normalize(&RawRoles::One(String::new())).is_empty());
        assert!(RoleSet::normalize(&RawRoles::One("  ".to_string())).is_empty());
    }

    // ── RawRoles deserialization ─────────────────────────────────────

    #[test]
    fn test_raw_roles_from_null() {
        let raw: RawRoles = serde_json::from_str("null").unwrap();
        assert!(RoleSet::normalize(&raw).is_empty());
    }

    #[test]
    fn test_raw_roles_from_string() {
        let raw: RawRoles = serde_json::from_str("\"Admin\"").unwrap();
        assert_eq!(RoleSet::normalize(&raw).names(), vec!["Admin"]);
    }

    #[test]
    fn test_raw_roles_from_array() {
        let raw: RawRoles = serde_json::from_str("[\"Engineer\",\"Manager\"]").unwrap();
        assert_eq!(
            RoleSet::normalize(&raw).names(),
            vec!["Engineer", "Manager"]
        );
    }

    // ── Membership ───────────────────────────────────────────────────

    #[test]
    fn test_contains_any() {
        let set = RoleSet::new([Role::Engineer, Role::Manager]);
        assert!(set.contains_any(&[Role::Manager, Role::Admin]));
        assert!(!set.contains_any(&[Role::Lead, Role::Admin]));
        assert!(!RoleSet::empty().contains_any(Role::all()));
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in Role::all() {
            assert_eq!(*role, role.as_str().parse::<Role>().unwrap());
        }
    }

    #[test]
    fn test_role_parse_is_case_sensitive() {
        assert!("admin".parse::<Role>().is_err());
        assert!("ADMIN".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }
}
