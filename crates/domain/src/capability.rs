use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Role name that bypasses every capability check.
///
/// The bypass is keyed on the role name, not on a permission: any role
/// literally named `admin` grants it.
pub const ADMIN_ROLE: &str = "admin";

/// Role and permission names held by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    roles: BTreeSet<String>,
    permissions: BTreeSet<String>,
}

impl Capabilities {
    /// Creates a capability set from role and permission names.
    #[must_use]
    pub fn new(
        roles: impl IntoIterator<Item = String>,
        permissions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Returns the role names.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Returns the permission names.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.permissions.is_empty()
    }

    /// Returns whether the role set carries the admin bypass.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.contains(ADMIN_ROLE)
    }

    /// Evaluates a capability check against this set.
    ///
    /// An absent check is unrestricted. Admins pass every check.
    #[must_use]
    pub fn can(&self, check: Option<&CapabilityCheck>) -> bool {
        let Some(check) = check else {
            return true;
        };

        if self.is_admin() {
            return true;
        }

        contains_all(&self.permissions, &check.all_of)
            && contains_any(&self.permissions, &check.any_of)
            && contains_all(&self.roles, &check.roles_all_of)
            && contains_any(&self.roles, &check.roles_any_of)
    }
}

fn contains_all(held: &BTreeSet<String>, required: &[String]) -> bool {
    required.iter().all(|name| held.contains(name))
}

fn contains_any(held: &BTreeSet<String>, candidates: &[String]) -> bool {
    candidates.is_empty() || candidates.iter().any(|name| held.contains(name))
}

/// Declarative capability requirement.
///
/// Every empty list is vacuously satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityCheck {
    /// Permissions that must all be held.
    #[serde(default)]
    pub all_of: Vec<String>,
    /// Permissions of which at least one must be held.
    #[serde(default)]
    pub any_of: Vec<String>,
    /// Roles that must all be held.
    #[serde(default)]
    pub roles_all_of: Vec<String>,
    /// Roles of which at least one must be held.
    #[serde(default)]
    pub roles_any_of: Vec<String>,
}

impl CapabilityCheck {
    /// Creates an empty (unrestricted) check.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires every listed permission.
    #[must_use]
    pub fn all_of<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.all_of.extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Requires at least one listed permission.
    #[must_use]
    pub fn any_of<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.any_of.extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Requires every listed role.
    #[must_use]
    pub fn roles_all_of<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles_all_of.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Requires at least one listed role.
    #[must_use]
    pub fn roles_any_of<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles_any_of.extend(roles.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Capabilities, CapabilityCheck};

    fn capabilities(roles: &[&str], permissions: &[&str]) -> Capabilities {
        Capabilities::new(
            roles.iter().map(|value| (*value).to_owned()),
            permissions.iter().map(|value| (*value).to_owned()),
        )
    }

    #[test]
    fn any_of_passes_with_one_held_permission() {
        let held = capabilities(&[], &["harvests.read"]);
        let check = CapabilityCheck::new().any_of(["harvests.read", "harvests.create"]);

        assert!(held.can(Some(&check)));
    }

    #[test]
    fn all_of_fails_when_one_permission_is_missing() {
        let held = capabilities(&[], &["harvests.read"]);
        let check = CapabilityCheck::new().all_of(["harvests.read", "harvests.create"]);

        assert!(!held.can(Some(&check)));
    }

    #[test]
    fn absent_and_empty_checks_are_unrestricted() {
        let held = Capabilities::default();

        assert!(held.can(None));
        assert!(held.can(Some(&CapabilityCheck::new())));
    }

    #[test]
    fn admin_role_bypasses_unsatisfiable_checks() {
        let held = capabilities(&["admin"], &[]);
        let check = CapabilityCheck::new()
            .roles_any_of(["admin"])
            .all_of(["nonexistent.permission"])
            .any_of(["nonexistent.permission"]);

        assert!(held.can(Some(&check)));
    }

    #[test]
    fn admin_bypass_is_role_based_not_permission_based() {
        let held = capabilities(&[], &["admin"]);
        let check = CapabilityCheck::new().any_of(["users.read"]);

        assert!(!held.can(Some(&check)));
    }

    #[test]
    fn role_constraints_are_evaluated_alongside_permissions() {
        let held = capabilities(&["curator"], &["resources.read"]);

        assert!(held.can(Some(
            &CapabilityCheck::new()
                .roles_any_of(["curator", "specialist"])
                .all_of(["resources.read"])
        )));
        assert!(!held.can(Some(
            &CapabilityCheck::new().roles_all_of(["curator", "specialist"])
        )));
    }

    proptest! {
        #[test]
        fn any_admin_session_passes_any_check(
            permissions in proptest::collection::vec("[a-z]{1,8}\\.[a-z]{1,8}", 0..6),
            required in proptest::collection::vec("[a-z]{1,8}\\.[a-z]{1,8}", 0..6),
        ) {
            let held = Capabilities::new(["admin".to_owned()], permissions);
            let check = CapabilityCheck::new().all_of(required.clone()).any_of(required);
            prop_assert!(held.can(Some(&check)));
        }

        #[test]
        fn held_permissions_always_satisfy_all_of(
            permissions in proptest::collection::vec("[a-z]{1,8}\\.[a-z]{1,8}", 1..8),
        ) {
            let held = Capabilities::new(Vec::<String>::new(), permissions.clone());
            let check = CapabilityCheck::new().all_of(permissions.clone()).any_of(permissions);
            prop_assert!(held.can(Some(&check)));
        }
    }
}
