use std::sync::Arc;
use std::time::Duration;

use crate::{
    AuthService, AuthorizationGate, DEFAULT_RECONCILE_INTERVAL, GuardRoutes, HttpTransport,
    ReconcileLoop, ReconcileTrigger, RouteLocator, SessionClient, SessionClientConfig,
    SessionStorage, SessionStore,
};

/// Wiring options for [`SessionRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRuntimeConfig {
    /// Session client options.
    pub client: SessionClientConfig,
    /// Route guard targets and public routes.
    pub routes: GuardRoutes,
    /// Period of timer-driven reconciles.
    pub reconcile_interval: Duration,
}

impl Default for SessionRuntimeConfig {
    fn default() -> Self {
        Self {
            client: SessionClientConfig::default(),
            routes: GuardRoutes::default(),
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
        }
    }
}

/// Owns one session and every service working on it.
pub struct SessionRuntime {
    auth: AuthService,
    gate: AuthorizationGate,
    reconcile_interval: Duration,
    reconcile: Option<ReconcileLoop>,
}

impl SessionRuntime {
    /// Hydrates the session from storage and wires the services.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn SessionStorage>,
        locator: Arc<dyn RouteLocator>,
        config: SessionRuntimeConfig,
    ) -> Self {
        let store = SessionStore::hydrate(storage.clone());
        let client = SessionClient::new(transport, store.clone(), config.client);
        let auth = AuthService::new(client, locator, config.routes.public_routes.clone());
        let gate = AuthorizationGate::new(store, storage, config.routes);

        Self {
            auth,
            gate,
            reconcile_interval: config.reconcile_interval,
            reconcile: None,
        }
    }

    /// Returns the session store.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        self.auth.store()
    }

    /// Returns the session client for resource calls.
    #[must_use]
    pub fn client(&self) -> &SessionClient {
        self.auth.client()
    }

    /// Returns the auth service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Returns the authorization gate.
    #[must_use]
    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// Starts the reconcile loop unless it already runs.
    pub fn start_reconcile(&mut self) {
        if self.reconcile.is_none() {
            self.reconcile = Some(ReconcileLoop::spawn(
                self.auth.clone(),
                self.reconcile_interval,
            ));
        }
    }

    /// Forwards a UI trigger to the reconcile loop.
    ///
    /// Returns `false` when the loop is not running or the trigger was
    /// dropped.
    pub fn notify(&self, trigger: ReconcileTrigger) -> bool {
        self.reconcile
            .as_ref()
            .is_some_and(|reconcile| reconcile.notify(trigger))
    }

    /// Stops background work. The session itself is left as is.
    pub async fn dispose(mut self) {
        if let Some(reconcile) = self.reconcile.take() {
            reconcile.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use harvestgate_domain::{GuardOutcome, RouteGuard};

    use super::{SessionRuntime, SessionRuntimeConfig};
    use crate::test_support::{FakeTransport, FixedLocator, MemoryStorage, RefreshBehavior};
    use crate::{LoginCredentials, ReconcileTrigger};

    #[tokio::test(start_paused = true)]
    async fn runtime_wires_login_gate_and_reconcile() {
        let transport = Arc::new(FakeTransport::new(RefreshBehavior::Succeed));
        let mut runtime = SessionRuntime::new(
            transport.clone(),
            Arc::new(MemoryStorage::default()),
            Arc::new(FixedLocator::new("/dashboard")),
            SessionRuntimeConfig::default(),
        );
        assert!(!runtime.notify(ReconcileTrigger::Mount));
        assert_eq!(
            runtime.gate().guard(&RouteGuard::Protected, "/harvests"),
            GuardOutcome::Redirect("/login".to_owned())
        );

        let credentials = match LoginCredentials::new("ana@example.org", "secret") {
            Ok(credentials) => credentials,
            Err(error) => panic!("credentials should be valid: {error}"),
        };
        assert!(runtime.auth().login(&credentials).await.is_ok());
        assert_eq!(
            runtime.gate().guard(&RouteGuard::PublicOnly, "/login"),
            GuardOutcome::Redirect("/harvests".to_owned())
        );

        runtime.start_reconcile();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.refresh_calls(), 1);
        assert!(runtime.notify(ReconcileTrigger::WindowFocus));

        runtime.dispose().await;
    }
}
