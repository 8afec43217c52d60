use serde::{Deserialize, Serialize};

use crate::{CapabilityCheck, Session};

/// Guard attached to a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "check")]
pub enum RouteGuard {
    /// Only anonymous visitors (login, password reset).
    PublicOnly,
    /// Any authenticated user.
    Protected,
    /// Authenticated users passing the capability check.
    PermissionProtected(CapabilityCheck),
}

/// Guard decision before redirect targets are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the route.
    Allow,
    /// Session is still resolving; render a neutral placeholder.
    Pending,
    /// Send the visitor to login, remembering where they were going.
    RedirectToLogin,
    /// Send an authenticated user to the default landing page.
    RedirectToDefault,
    /// Send an authenticated user to the remembered continue-to path.
    RedirectToContinue,
}

impl RouteGuard {
    /// Decides what a session may do with the guarded route.
    ///
    /// A session is only pending while it is loading without a hydrated
    /// user; an optimistic session from storage renders immediately.
    #[must_use]
    pub fn decide(&self, session: &Session) -> GuardDecision {
        let pending = session.is_loading() && !session.is_authenticated();

        match self {
            Self::PublicOnly if session.is_authenticated() => GuardDecision::RedirectToContinue,
            Self::PublicOnly => GuardDecision::Allow,
            Self::Protected | Self::PermissionProtected(_) if pending => GuardDecision::Pending,
            Self::Protected | Self::PermissionProtected(_) if !session.is_authenticated() => {
                GuardDecision::RedirectToLogin
            }
            Self::Protected => GuardDecision::Allow,
            Self::PermissionProtected(check) => {
                if session.capabilities().can(Some(check)) {
                    GuardDecision::Allow
                } else {
                    GuardDecision::RedirectToDefault
                }
            }
        }
    }
}

/// Route outcome with a concrete redirect target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Render the route.
    Allow,
    /// Navigate to the given path instead.
    Redirect(String),
    /// Render a loading placeholder.
    Pending,
}

/// Path pattern with `:param` segments and an optional trailing `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePattern(String);

impl RoutePattern {
    /// Creates a pattern such as `/resources/:id` or `/landing/*`.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Returns the raw pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether a path matches this pattern. Query strings and
    /// fragments are ignored, as are trailing slashes.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut pattern_segments = segments(&self.0);
        let mut path_segments = segments(path);

        loop {
            match (pattern_segments.next(), path_segments.next()) {
                (Some("*"), _) => return true,
                (Some(expected), Some(actual)) => {
                    if !expected.starts_with(':') && expected != actual {
                        return false;
                    }
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

fn segments(value: &str) -> impl Iterator<Item = &str> {
    value.split('/').filter(|segment| !segment.is_empty())
}

/// Allow-list of routes reachable without a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicRoutes {
    patterns: Vec<RoutePattern>,
}

impl PublicRoutes {
    /// Creates an allow-list from patterns.
    #[must_use]
    pub fn new(patterns: impl IntoIterator<Item = RoutePattern>) -> Self {
        Self {
            patterns: patterns.into_iter().collect(),
        }
    }

    /// Returns whether the path is publicly accessible.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }

    /// Returns the configured patterns.
    #[must_use]
    pub fn patterns(&self) -> &[RoutePattern] {
        &self.patterns
    }
}

impl Default for PublicRoutes {
    fn default() -> Self {
        Self::new(
            [
                "/",
                "/login",
                "/forgot-password",
                "/reset-password/:token",
                "/auth/sso/callback",
                "/search",
                "/search/*",
                "/resources/:id/view",
                "/relations/vote/:token",
                "/about",
            ]
            .into_iter()
            .map(RoutePattern::new),
        )
    }
}
