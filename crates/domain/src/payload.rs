use std::collections::BTreeSet;

use harvestgate_core::SessionUser;
use serde::{Deserialize, Serialize};

use crate::Capabilities;

/// Permission reference as emitted by the backend: a bare name or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionEntry {
    /// Bare permission name.
    Name(String),
    /// Permission object carrying its name.
    Named {
        /// Permission name.
        name: String,
    },
}

impl PermissionEntry {
    /// Returns the permission name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Named { name } => name.as_str(),
        }
    }
}

/// Role reference as emitted by the backend: a bare name or an object with
/// nested permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleEntry {
    /// Bare role name.
    Name(String),
    /// Role object with the permissions it bundles.
    Detailed {
        /// Role name.
        name: String,
        /// Permissions granted through this role.
        #[serde(default)]
        permissions: Vec<PermissionEntry>,
    },
}

impl RoleEntry {
    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name.as_str(),
        }
    }

    /// Returns the permissions bundled by the role.
    #[must_use]
    pub fn permissions(&self) -> &[PermissionEntry] {
        match self {
            Self::Name(_) => &[],
            Self::Detailed { permissions, .. } => permissions.as_slice(),
        }
    }
}

/// Session payload returned by login, SSO exchange and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// Authenticated user.
    pub user: SessionUser,
    /// Roles assigned to the user.
    #[serde(default)]
    pub roles: Vec<RoleEntry>,
    /// Permissions assigned directly to the user.
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
}

impl SessionPayload {
    /// Flattens roles and permissions into a capability set.
    ///
    /// Permissions are the union of direct permissions and the permissions
    /// nested in every role. Blank names are dropped.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        let roles: BTreeSet<String> = self
            .roles
            .iter()
            .map(RoleEntry::name)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_owned)
            .collect();

        let permissions: BTreeSet<String> = self
            .permissions
            .iter()
            .chain(self.roles.iter().flat_map(RoleEntry::permissions))
            .map(PermissionEntry::name)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_owned)
            .collect();

        Capabilities::new(roles, permissions)
    }
}
