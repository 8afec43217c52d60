use harvestgate_domain::Surface;

use super::*;

impl AuthorizationGate {
    /// Returns the console surfaces the current session may open.
    ///
    /// A surface is accessible when the session holds at least one of the
    /// permissions it requires. Admins see every surface.
    #[must_use]
    pub fn accessible_surfaces(&self) -> Vec<Surface> {
        self.store.read(|session| {
            Surface::all()
                .iter()
                .copied()
                .filter(|surface| session.capabilities().can(Some(&surface.required_check())))
                .collect()
        })
    }

    /// Returns whether the current session may open the surface.
    #[must_use]
    pub fn can_access(&self, surface: Surface) -> bool {
        self.can(Some(&surface.required_check()))
    }
}
