use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use harvestgate_core::{AppError, SessionUser};

use crate::{Capabilities, SessionPayload};

/// Client-side authentication state.
///
/// A session without a user never carries roles or permissions: the only
/// way to attach capabilities is [`Session::authenticated`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<SessionUser>,
    capabilities: Capabilities,
    loading: bool,
    error: Option<AppError>,
    synced_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates an empty, logged-out session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates a session for an authenticated user.
    #[must_use]
    pub fn authenticated(user: SessionUser, capabilities: Capabilities) -> Self {
        Self {
            user: Some(user),
            capabilities,
            loading: false,
            error: None,
            synced_at: None,
        }
    }

    /// Creates a session from a server payload, stamped with the sync time.
    #[must_use]
    pub fn from_payload(payload: &SessionPayload, synced_at: DateTime<Utc>) -> Self {
        Self {
            synced_at: Some(synced_at),
            ..Self::authenticated(payload.user.clone(), payload.capabilities())
        }
    }

    /// Returns the authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Returns whether a user is attached.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Returns the role names.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        self.capabilities.roles()
    }

    /// Returns the permission names.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<String> {
        self.capabilities.permissions()
    }

    /// Returns the capability snapshot used by authorization checks.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Returns whether session resolution is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns the last session-related failure.
    #[must_use]
    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    /// Returns when the last server payload was applied.
    #[must_use]
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }

    /// Marks session resolution as started.
    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Marks session resolution as settled, recording the failure if any.
    pub fn finish_loading(&mut self, error: Option<AppError>) {
        self.loading = false;
        self.error = error;
    }

    /// Drops the user and every capability, keeping the clear reason.
    pub fn clear(&mut self, reason: Option<AppError>) {
        *self = Self {
            error: reason,
            ..Self::anonymous()
        };
    }
}

#[cfg(test)]
mod tests {
    use harvestgate_core::{AppError, RecordKey, SessionUser};

    use super::Session;
    use crate::Capabilities;

    fn signed_in() -> Session {
        Session::authenticated(
            SessionUser::new(RecordKey::new("1"), "Ana", None),
            Capabilities::new(["curator".to_owned()], ["resources.read".to_owned()]),
        )
    }

    #[test]
    fn clear_drops_user_and_capabilities() {
        let mut session = signed_in();
        session.clear(Some(AppError::Unauthorized("expired".to_owned())));

        assert!(session.user().is_none());
        assert!(session.roles().is_empty());
        assert!(session.permissions().is_empty());
        assert!(matches!(session.error(), Some(AppError::Unauthorized(_))));
    }

    #[test]
    fn loading_flags_do_not_touch_identity() {
        let mut session = signed_in();
        session.begin_loading();
        assert!(session.is_loading());

        session.finish_loading(Some(AppError::Network("offline".to_owned())));
        assert!(!session.is_loading());
        assert!(session.is_authenticated());
        assert_eq!(session.permissions().len(), 1);
    }
}
