use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{AuthService, ReconcileTrigger};

/// Default period between timer-driven reconciles.
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(300);

const MIN_RECONCILE_INTERVAL: Duration = Duration::from_secs(1);
const TRIGGER_BUFFER: usize = 8;

/// Background task reconciling the session on mount, on UI triggers and on
/// a fixed interval.
///
/// Dropping the handle aborts the task; [`ReconcileLoop::stop`] ends it
/// gracefully.
pub struct ReconcileLoop {
    triggers: mpsc::Sender<ReconcileTrigger>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ReconcileLoop {
    /// Spawns the loop. The first reconcile runs immediately as a mount.
    #[must_use]
    pub fn spawn(auth: AuthService, interval: Duration) -> Self {
        let interval = interval.max(MIN_RECONCILE_INTERVAL);
        let (triggers, receiver) = mpsc::channel(TRIGGER_BUFFER);
        let (shutdown, shutdown_signal) = oneshot::channel();
        let task = tokio::spawn(run(auth, interval, receiver, shutdown_signal));
        info!(interval_secs = interval.as_secs(), "session reconcile loop started");

        Self {
            triggers,
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    /// Requests a reconcile. Returns `false` when the trigger was dropped
    /// because the loop is busy or stopped.
    pub fn notify(&self, trigger: ReconcileTrigger) -> bool {
        match self.triggers.try_send(trigger) {
            Ok(()) => true,
            Err(error) => {
                debug!(trigger = trigger.as_str(), error = %error, "reconcile trigger dropped");
                false
            }
        }
    }

    /// Stops the loop and waits for an in-progress reconcile to finish.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(task) = self.task.take()
            && let Err(error) = task.await
        {
            warn!(error = %error, "session reconcile loop ended abnormally");
        }
        info!("session reconcile loop stopped");
    }
}

impl Drop for ReconcileLoop {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    auth: AuthService,
    interval: Duration,
    mut triggers: mpsc::Receiver<ReconcileTrigger>,
    mut shutdown: oneshot::Receiver<()>,
) {
    auth.reconcile(ReconcileTrigger::Mount).await;

    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let trigger = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => ReconcileTrigger::Timer,
            Some(trigger) = triggers.recv() => trigger,
        };

        auth.reconcile(trigger).await;
    }
}
