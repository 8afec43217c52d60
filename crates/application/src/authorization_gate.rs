//! Capability checks and route guards evaluated against the live session.

use std::sync::Arc;

use harvestgate_domain::{
    Capabilities, CapabilityCheck, GuardDecision, GuardOutcome, PublicRoutes, RouteGuard,
};
use tracing::{debug, warn};

use crate::{CONTINUE_TO_STORAGE_KEY, SessionStorage, SessionStore};

mod surfaces;

/// Redirect targets used by route guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRoutes {
    /// Where anonymous visitors are sent.
    pub login_path: String,
    /// Landing page for authenticated users.
    pub default_path: String,
    /// Routes reachable without a session.
    pub public_routes: PublicRoutes,
}

impl Default for GuardRoutes {
    fn default() -> Self {
        Self {
            login_path: "/login".to_owned(),
            default_path: "/dashboard".to_owned(),
            public_routes: PublicRoutes::default(),
        }
    }
}

/// Read-only authorization view over the session store.
#[derive(Clone)]
pub struct AuthorizationGate {
    store: SessionStore,
    storage: Arc<dyn SessionStorage>,
    routes: GuardRoutes,
}

impl AuthorizationGate {
    /// Creates a gate. `storage` keeps the continue-to path across restarts.
    #[must_use]
    pub fn new(store: SessionStore, storage: Arc<dyn SessionStorage>, routes: GuardRoutes) -> Self {
        Self {
            store,
            storage,
            routes,
        }
    }

    /// Returns the configured redirect targets.
    #[must_use]
    pub fn routes(&self) -> &GuardRoutes {
        &self.routes
    }

    /// Returns whether the current session satisfies the check.
    #[must_use]
    pub fn can(&self, check: Option<&CapabilityCheck>) -> bool {
        self.store
            .read(|session| session.capabilities().can(check))
    }

    /// Returns a copy of the current capabilities.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.store.capabilities()
    }

    /// Returns whether the path is on the public allow-list.
    #[must_use]
    pub fn is_public_path(&self, path: &str) -> bool {
        self.routes.public_routes.is_public(path)
    }

    /// Resolves a guard for the attempted path.
    ///
    /// Anonymous visitors on guarded routes get their path remembered as the
    /// continue-to target; the public-only guard consumes it.
    pub fn guard(&self, guard: &RouteGuard, attempted_path: &str) -> GuardOutcome {
        let decision = self.store.read(|session| guard.decide(session));
        debug!(path = %attempted_path, decision = ?decision, "route guard evaluated");

        match decision {
            GuardDecision::Allow => GuardOutcome::Allow,
            GuardDecision::Pending => GuardOutcome::Pending,
            GuardDecision::RedirectToLogin => {
                self.remember_continue_to(attempted_path);
                GuardOutcome::Redirect(self.routes.login_path.clone())
            }
            GuardDecision::RedirectToDefault => {
                GuardOutcome::Redirect(self.routes.default_path.clone())
            }
            GuardDecision::RedirectToContinue => GuardOutcome::Redirect(
                self.take_continue_to()
                    .unwrap_or_else(|| self.routes.default_path.clone()),
            ),
        }
    }

    fn remember_continue_to(&self, path: &str) {
        if !is_local_path(path) || path == self.routes.login_path {
            return;
        }

        if let Err(error) = self.storage.set(CONTINUE_TO_STORAGE_KEY, path) {
            warn!(error = %error, "failed to remember continue-to path");
        }
    }

    fn take_continue_to(&self) -> Option<String> {
        let stored = match self.storage.get(CONTINUE_TO_STORAGE_KEY) {
            Ok(stored) => stored,
            Err(error) => {
                warn!(error = %error, "failed to read continue-to path");
                None
            }
        };
        if let Err(error) = self.storage.remove(CONTINUE_TO_STORAGE_KEY) {
            warn!(error = %error, "failed to forget continue-to path");
        }

        stored.filter(|path| is_local_path(path))
    }
}

/// Only same-origin absolute paths are followed after login. Browsers read
/// a backslash as a slash, so `/\host` is as foreign as `//host`.
fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.contains("://")
}
