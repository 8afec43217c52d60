//! Session lifecycle operations: login, SSO exchange, logout and silent
//! reconciliation against the backend.

use std::fmt;
use std::sync::Arc;

use harvestgate_core::{AppError, AppResult, NonEmptyString};
use harvestgate_domain::PublicRoutes;
use serde::Serialize;

use crate::{RouteLocator, SessionClient, SessionStore};

mod login;
mod reconcile;

/// Email/password pair sent to the login endpoint.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    email: NonEmptyString,
    password: NonEmptyString,
}

impl LoginCredentials {
    /// Validates that neither field is blank.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> AppResult<Self> {
        let email = NonEmptyString::new(email)
            .map_err(|_| AppError::Validation("email is required".to_owned()))?;
        let password = NonEmptyString::new(password)
            .map_err(|_| AppError::Validation("password is required".to_owned()))?;

        Ok(Self { email, password })
    }

    /// Returns the email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoginCredentials")
            .field("email", &self.email.as_str())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Event that asks for the session to be re-validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileTrigger {
    /// Initial render after startup.
    Mount,
    /// Window regained focus.
    WindowFocus,
    /// Document became visible again.
    VisibilityChange,
    /// Periodic timer tick.
    Timer,
}

impl ReconcileTrigger {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mount => "mount",
            Self::WindowFocus => "window_focus",
            Self::VisibilityChange => "visibility_change",
            Self::Timer => "timer",
        }
    }
}

/// Result of one reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The session was confirmed (or renewed) by the backend.
    Refreshed,
    /// The current route is public; nothing was sent.
    SkippedPublicRoute,
    /// The refresh failed; the error says whether the session was cleared.
    Failed(AppError),
}

/// Application service driving session transitions through the client.
#[derive(Clone)]
pub struct AuthService {
    client: SessionClient,
    locator: Arc<dyn RouteLocator>,
    public_routes: PublicRoutes,
}

impl AuthService {
    /// Creates an auth service.
    #[must_use]
    pub fn new(
        client: SessionClient,
        locator: Arc<dyn RouteLocator>,
        public_routes: PublicRoutes,
    ) -> Self {
        Self {
            client,
            locator,
            public_routes,
        }
    }

    /// Returns the store updated by this service.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        self.client.store()
    }

    /// Returns the underlying session client.
    #[must_use]
    pub fn client(&self) -> &SessionClient {
        &self.client
    }
}
