use std::collections::VecDeque;
use std::time::Duration;

use harvestgate_core::{AppError, AppResult};
use harvestgate_domain::SessionPayload;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{SessionClient, interpret_response};
use crate::{HttpRequest, HttpResponse};

type RefreshOutcome = AppResult<SessionPayload>;

/// Refresh lifecycle shared by every caller of one client.
pub(super) enum RefreshState {
    Idle,
    Refreshing(InFlightRefresh),
    CooldownAfter {
        completed_at: Instant,
        payload: SessionPayload,
    },
}

impl RefreshState {
    fn cooled_payload(&self, cooldown: Duration) -> Option<&SessionPayload> {
        match self {
            Self::CooldownAfter {
                completed_at,
                payload,
            } if completed_at.elapsed() < cooldown => Some(payload),
            _ => None,
        }
    }
}

/// Refresh currently running in a spawned task.
pub(super) struct InFlightRefresh {
    outcome: watch::Receiver<Option<RefreshOutcome>>,
    pending: VecDeque<PendingRequest>,
}

/// Request rejected as unauthenticated, parked until the refresh settles.
struct PendingRequest {
    request: HttpRequest,
    responder: oneshot::Sender<AppResult<HttpResponse>>,
}

impl SessionClient {
    pub(super) async fn retry_after_refresh(
        &self,
        request: HttpRequest,
    ) -> AppResult<HttpResponse> {
        let (responder, mut settled) = oneshot::channel();
        let pending = PendingRequest { request, responder };

        let outcome = {
            let mut state = self.inner.refresh.lock().await;
            reclaim_if_abandoned(&mut state);

            if state
                .cooled_payload(self.inner.config.refresh_cooldown)
                .is_some()
            {
                drop(state);
                debug!(
                    request_id = %pending.request.id(),
                    "session was refreshed moments ago; replaying without a new refresh"
                );
                return self.replay(pending.request).await;
            }

            if let RefreshState::Refreshing(in_flight) = &mut *state {
                in_flight.pending.push_back(pending);
                debug!(
                    queued = in_flight.pending.len(),
                    "queued request behind in-flight session refresh"
                );
                in_flight.outcome.clone()
            } else {
                let mut in_flight = self.begin_refresh();
                in_flight.pending.push_back(pending);
                let outcome = in_flight.outcome.clone();
                *state = RefreshState::Refreshing(in_flight);
                outcome
            }
        };

        tokio::select! {
            biased;
            result = &mut settled => return unqueued(result),
            () = refresh_task_ended(outcome) => {}
        }

        reclaim_if_abandoned(&mut *self.inner.refresh.lock().await);
        unqueued(settled.await)
    }

    pub(super) async fn shared_refresh(&self) -> RefreshOutcome {
        let mut outcome = {
            let mut state = self.inner.refresh.lock().await;
            reclaim_if_abandoned(&mut state);

            if let Some(payload) = state.cooled_payload(self.inner.config.refresh_cooldown) {
                debug!("session refresh skipped inside cooldown window");
                return Ok(payload.clone());
            }

            if let RefreshState::Refreshing(in_flight) = &*state {
                in_flight.outcome.clone()
            } else {
                let in_flight = self.begin_refresh();
                let outcome = in_flight.outcome.clone();
                *state = RefreshState::Refreshing(in_flight);
                outcome
            }
        };

        let settled = outcome
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|settled| settled.clone());

        match settled {
            Some(settled) => settled,
            None => {
                reclaim_if_abandoned(&mut *self.inner.refresh.lock().await);
                Err(missing_outcome())
            }
        }
    }

    /// Drops a cached refresh outcome so the next refresh hits the network.
    /// An in-flight refresh keeps running; the session store discards its
    /// result once the session has changed hands.
    pub(crate) async fn forget_refresh(&self) {
        let mut state = self.inner.refresh.lock().await;
        if matches!(*state, RefreshState::CooldownAfter { .. }) {
            *state = RefreshState::Idle;
        }
    }

    /// Spawns the refresh task. The caller must store the returned handle
    /// in the state while still holding the lock.
    fn begin_refresh(&self) -> InFlightRefresh {
        let (sender, receiver) = watch::channel(None);
        let generation = self.inner.store.generation();
        debug!(generation, "starting session refresh");
        tokio::spawn(self.clone().run_refresh(sender, generation));

        InFlightRefresh {
            outcome: receiver,
            pending: VecDeque::new(),
        }
    }

    async fn run_refresh(self, sender: watch::Sender<Option<RefreshOutcome>>, generation: u64) {
        let outcome = self.fetch_session_payload().await;
        let store = &self.inner.store;

        let current = match &outcome {
            Ok(payload) => {
                let applied = store.apply_refreshed(payload, generation);
                if applied {
                    info!(user_id = %payload.user.id(), "session refreshed");
                }
                applied
            }
            Err(error) if error.confirms_invalid_session() => {
                let cleared = store.clear_if_current(error.clone(), generation);
                if cleared {
                    warn!(error = %error, "session refresh rejected; clearing session");
                }
                cleared
            }
            Err(error) => {
                warn!(error = %error, "session refresh failed; keeping current session");
                store.generation() == generation
            }
        };
        if !current {
            info!("session changed during refresh; discarding refresh result");
        }

        sender.send_replace(Some(outcome.clone()));
        self.flush_pending(&outcome, current).await;
    }

    /// Settles queued requests in enqueue order until the queue is empty,
    /// then leaves the refreshing state. Only a current success is cached.
    async fn flush_pending(&self, outcome: &RefreshOutcome, current: bool) {
        loop {
            let next = {
                let mut state = self.inner.refresh.lock().await;
                let RefreshState::Refreshing(in_flight) = &mut *state else {
                    return;
                };

                match in_flight.pending.pop_front() {
                    Some(pending) => pending,
                    None => {
                        *state = match outcome {
                            Ok(payload) if current => RefreshState::CooldownAfter {
                                completed_at: Instant::now(),
                                payload: payload.clone(),
                            },
                            _ => RefreshState::Idle,
                        };
                        return;
                    }
                }
            };

            let settlement = match outcome {
                Ok(_) => self.replay(next.request).await,
                Err(error) => Err(error.clone()),
            };

            if next.responder.send(settlement).is_err() {
                debug!("queued caller went away before its request settled");
            }
        }
    }

    async fn fetch_session_payload(&self) -> RefreshOutcome {
        let request = HttpRequest::post(self.inner.config.endpoints.refresh.as_str());
        let response = self.inner.transport.send(&request).await?;

        interpret_response(response)?.json()
    }

    async fn replay(&self, request: HttpRequest) -> AppResult<HttpResponse> {
        debug!(
            request_id = %request.id(),
            path = %request.path(),
            "replaying request after session refresh"
        );
        let response = self.inner.transport.send(&request).await?;

        interpret_response(response)
    }
}

/// Settles requests stranded by a refresh task that died before flushing
/// its queue, and returns the state to idle.
fn reclaim_if_abandoned(state: &mut RefreshState) {
    let RefreshState::Refreshing(in_flight) = state else {
        return;
    };
    if in_flight.outcome.has_changed().is_ok() {
        return;
    }

    warn!(
        stranded = in_flight.pending.len(),
        "session refresh task ended without settling its queue"
    );
    for pending in in_flight.pending.drain(..) {
        let _ = pending.responder.send(Err(missing_outcome()));
    }
    *state = RefreshState::Idle;
}

/// Resolves once the refresh task has dropped its outcome sender.
async fn refresh_task_ended(mut outcome: watch::Receiver<Option<RefreshOutcome>>) {
    while outcome.changed().await.is_ok() {}
}

fn unqueued(
    result: Result<AppResult<HttpResponse>, oneshot::error::RecvError>,
) -> AppResult<HttpResponse> {
    result.map_err(|_| {
        AppError::Internal("session refresh ended without settling a queued request".to_owned())
    })?
}

fn missing_outcome() -> AppError {
    AppError::Internal("session refresh ended without an outcome".to_owned())
}
