use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use harvestgate_core::{AppError, AppResult, SessionUser};
use harvestgate_domain::{Capabilities, Session, SessionPayload};
use tokio::sync::watch;
use tracing::warn;

use crate::{PERMISSIONS_STORAGE_KEY, ROLES_STORAGE_KEY, SessionStorage, USER_STORAGE_KEY};

/// Single source of truth for the client session.
///
/// Readers subscribe to changes; only the session client and the auth
/// service inside this crate write. Every identity change is mirrored to
/// durable storage so a restart can render optimistically.
///
/// Each login or clear starts a new generation. Refresh outcomes carry the
/// generation they started in and are dropped once it has moved on.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<Session>>,
    storage: Arc<dyn SessionStorage>,
    generation: Arc<AtomicU64>,
}

impl SessionStore {
    /// Creates a store hydrated synchronously from durable storage.
    #[must_use]
    pub fn hydrate(storage: Arc<dyn SessionStorage>) -> Self {
        let session = match load_persisted_session(storage.as_ref()) {
            Ok(session) => session,
            Err(error) => {
                warn!(error = %error, "failed to hydrate persisted session; starting anonymous");
                Session::anonymous()
            }
        };
        let (state, _) = watch::channel(session);

        Self {
            state: Arc::new(state),
            storage,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Evaluates a closure against the current session without cloning it.
    pub fn read<R>(&self, reader: impl FnOnce(&Session) -> R) -> R {
        reader(&self.state.borrow())
    }

    /// Returns a copy of the current capability set.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.read(|session| session.capabilities().clone())
    }

    /// Subscribes to session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub(crate) fn begin_loading(&self) {
        self.state.send_modify(Session::begin_loading);
    }

    pub(crate) fn finish_loading(&self, error: Option<AppError>) {
        self.state
            .send_modify(|session| session.finish_loading(error));
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replaces the session wholesale with a newly established identity.
    pub(crate) fn apply_payload(&self, payload: &SessionPayload) -> Session {
        let next = Session::from_payload(payload, Utc::now());
        self.state.send_modify(|session| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            self.persist(&next);
            *session = next.clone();
        });

        next
    }

    /// Applies a refreshed payload unless the session changed hands since
    /// `generation` was read. Returns whether it was applied.
    pub(crate) fn apply_refreshed(&self, payload: &SessionPayload, generation: u64) -> bool {
        let next = Session::from_payload(payload, Utc::now());
        self.state.send_if_modified(|session| {
            if self.generation() != generation {
                return false;
            }
            self.persist(&next);
            *session = next;
            true
        })
    }

    /// Drops the session locally and from durable storage.
    pub(crate) fn clear(&self, reason: Option<AppError>) {
        self.state.send_modify(|session| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            self.forget();
            session.clear(reason);
        });
    }

    /// Clears the session unless it changed hands since `generation` was
    /// read. Returns whether it was cleared.
    pub(crate) fn clear_if_current(&self, reason: AppError, generation: u64) -> bool {
        self.state.send_if_modified(|session| {
            if self.generation() != generation {
                return false;
            }
            self.generation.fetch_add(1, Ordering::AcqRel);
            self.forget();
            session.clear(Some(reason));
            true
        })
    }

    fn persist(&self, session: &Session) {
        if let Some(user) = session.user()
            && let Err(error) = persist_session(self.storage.as_ref(), user, session.capabilities())
        {
            warn!(error = %error, "failed to persist session");
        }
    }

    fn forget(&self) {
        if let Err(error) = forget_session(self.storage.as_ref()) {
            warn!(error = %error, "failed to remove persisted session");
        }
    }
}

fn load_persisted_session(storage: &dyn SessionStorage) -> AppResult<Session> {
    let Some(raw_user) = storage.get(USER_STORAGE_KEY)? else {
        return Ok(Session::anonymous());
    };

    let user = serde_json::from_str::<SessionUser>(&raw_user).map_err(|error| {
        AppError::Validation(format!("persisted session user is malformed: {error}"))
    })?;
    let roles = load_name_set(storage, ROLES_STORAGE_KEY)?;
    let permissions = load_name_set(storage, PERMISSIONS_STORAGE_KEY)?;

    Ok(Session::authenticated(
        user,
        Capabilities::new(roles, permissions),
    ))
}

fn load_name_set(storage: &dyn SessionStorage, key: &str) -> AppResult<BTreeSet<String>> {
    match storage.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| {
            AppError::Validation(format!("persisted value '{key}' is malformed: {error}"))
        }),
        None => Ok(BTreeSet::new()),
    }
}

fn persist_session(
    storage: &dyn SessionStorage,
    user: &SessionUser,
    capabilities: &Capabilities,
) -> AppResult<()> {
    storage.set(USER_STORAGE_KEY, &encode(user)?)?;
    storage.set(ROLES_STORAGE_KEY, &encode(capabilities.roles())?)?;
    storage.set(PERMISSIONS_STORAGE_KEY, &encode(capabilities.permissions())?)
}

fn forget_session(storage: &dyn SessionStorage) -> AppResult<()> {
    storage.remove(USER_STORAGE_KEY)?;
    storage.remove(ROLES_STORAGE_KEY)?;
    storage.remove(PERMISSIONS_STORAGE_KEY)
}

fn encode<T>(value: &T) -> AppResult<String>
where
    T: serde::Serialize + ?Sized,
{
    serde_json::to_string(value)
        .map_err(|error| AppError::Internal(format!("failed to encode session value: {error}")))
}
