use std::str::FromStr;

use harvestgate_core::AppError;
use serde::{Deserialize, Serialize};

use crate::CapabilityCheck;

/// Permissions the console checks before showing a surface.
///
/// The backend may grant names outside this list; they still flow through
/// [`crate::Capabilities`] as plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows listing users.
    UsersRead,
    /// Allows listing roles.
    RolesRead,
    /// Allows listing specialists.
    SpecialistsRead,
    /// Allows listing harvested resources.
    ResourcesRead,
    /// Allows listing scheduled harvests.
    HarvestsRead,
    /// Allows scheduling harvests.
    HarvestsCreate,
    /// Allows listing resource relations.
    RelationsRead,
    /// Allows voting on proposed relations.
    RelationsApprove,
}

impl Permission {
    /// Returns the backend permission name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsersRead => "users.read",
            Self::RolesRead => "roles.read",
            Self::SpecialistsRead => "specialists.read",
            Self::ResourcesRead => "resources.read",
            Self::HarvestsRead => "harvests.read",
            Self::HarvestsCreate => "harvests.create",
            Self::RelationsRead => "relations.read",
            Self::RelationsApprove => "relations.approve",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::UsersRead,
            Permission::RolesRead,
            Permission::SpecialistsRead,
            Permission::ResourcesRead,
            Permission::HarvestsRead,
            Permission::HarvestsCreate,
            Permission::RelationsRead,
            Permission::RelationsApprove,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|permission| permission.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

/// Console screens gated by the authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Landing page for authenticated users.
    Dashboard,
    /// User administration.
    Users,
    /// Role administration.
    Roles,
    /// Specialist directory.
    Specialists,
    /// Harvested resources.
    Resources,
    /// Scheduled harvest tasks.
    Harvests,
    /// Resource-to-resource relations.
    Relations,
    /// Pending relation votes.
    RelationApprovals,
}

impl Surface {
    /// Returns all surfaces in navigation order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Surface] = &[
            Surface::Dashboard,
            Surface::Users,
            Surface::Roles,
            Surface::Specialists,
            Surface::Resources,
            Surface::Harvests,
            Surface::Relations,
            Surface::RelationApprovals,
        ];

        ALL
    }

    /// Returns the console path of the surface.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Dashboard => "/dashboard",
            Self::Users => "/users",
            Self::Roles => "/roles",
            Self::Specialists => "/specialists",
            Self::Resources => "/resources",
            Self::Harvests => "/harvests",
            Self::Relations => "/relations",
            Self::RelationApprovals => "/relations/approvals",
        }
    }

    /// Returns the permissions of which at least one unlocks the surface.
    ///
    /// An empty slice means any authenticated user may open it.
    #[must_use]
    pub fn required_permissions(&self) -> &'static [Permission] {
        match self {
            Self::Dashboard => &[],
            Self::Users => &[Permission::UsersRead],
            Self::Roles => &[Permission::RolesRead],
            Self::Specialists => &[Permission::SpecialistsRead],
            Self::Resources => &[Permission::ResourcesRead],
            Self::Harvests => &[Permission::HarvestsRead, Permission::HarvestsCreate],
            Self::Relations => &[Permission::RelationsRead],
            Self::RelationApprovals => &[Permission::RelationsApprove],
        }
    }

    /// Returns the capability check guarding the surface.
    #[must_use]
    pub fn required_check(&self) -> CapabilityCheck {
        CapabilityCheck::new().any_of(
            self.required_permissions()
                .iter()
                .map(|permission| permission.as_str()),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Permission, Surface};
    use crate::Capabilities;

    #[test]
    fn permission_roundtrip_storage_value() {
        for permission in Permission::all() {
            let restored = Permission::from_str(permission.as_str());
            assert!(matches!(restored, Ok(value) if value == *permission));
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        assert!(Permission::from_str("harvests.unknown").is_err());
    }

    #[test]
    fn harvests_surface_opens_with_either_permission() {
        let reader = Capabilities::new(Vec::<String>::new(), ["harvests.read".to_owned()]);
        let scheduler = Capabilities::new(Vec::<String>::new(), ["harvests.create".to_owned()]);
        let check = Surface::Harvests.required_check();

        assert!(reader.can(Some(&check)));
        assert!(scheduler.can(Some(&check)));
        assert!(!Capabilities::default().can(Some(&Surface::Users.required_check())));
    }

    #[test]
    fn dashboard_is_open_to_every_session() {
        assert!(Capabilities::default().can(Some(&Surface::Dashboard.required_check())));
    }
}
