use tracing::{debug, info, warn};

use super::*;

impl AuthService {
    /// Silently re-validates the session against the backend.
    ///
    /// Public routes are skipped. Triggers arriving together share one
    /// refresh. A failure keeps the current session unless the backend
    /// confirmed it invalid, in which case the client already cleared it.
    pub async fn reconcile(&self, trigger: ReconcileTrigger) -> ReconcileOutcome {
        let path = self.locator.current_path();
        if self.public_routes.is_public(&path) {
            debug!(
                trigger = trigger.as_str(),
                path = %path,
                "skipping session reconcile on public route"
            );
            return ReconcileOutcome::SkippedPublicRoute;
        }

        let store = self.store();
        store.begin_loading();

        match self.client.refresh_once().await {
            Ok(_) => {
                store.finish_loading(None);
                debug!(trigger = trigger.as_str(), "session reconciled");
                ReconcileOutcome::Refreshed
            }
            Err(error) => {
                store.finish_loading(Some(error.clone()));
                if error.is_network() {
                    info!(
                        trigger = trigger.as_str(),
                        error = %error,
                        "backend unreachable; session reconcile deferred"
                    );
                } else {
                    warn!(
                        trigger = trigger.as_str(),
                        error = %error,
                        "session reconcile failed"
                    );
                }
                ReconcileOutcome::Failed(error)
            }
        }
    }
}
