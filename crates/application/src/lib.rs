//! Application services and ports.

#![forbid(unsafe_code)]

mod auth_service;
mod authorization_gate;
mod reconcile_loop;
mod session_client;
mod session_ports;
mod session_runtime;
mod session_store;
mod suggestion_service;
#[cfg(test)]
mod test_support;

pub use auth_service::{AuthService, LoginCredentials, ReconcileOutcome, ReconcileTrigger};
pub use authorization_gate::{AuthorizationGate, GuardRoutes};
pub use reconcile_loop::{DEFAULT_RECONCILE_INTERVAL, ReconcileLoop};
pub use session_client::{
    AuthEndpoints, DEFAULT_REFRESH_COOLDOWN, SessionClient, SessionClientConfig,
};
pub use session_ports::{
    CONTINUE_TO_STORAGE_KEY, HttpRequest, HttpResponse, HttpTransport, PERMISSIONS_STORAGE_KEY,
    ROLES_STORAGE_KEY, RouteLocator, SessionStorage, SuggestionBackend, USER_STORAGE_KEY,
};
pub use session_runtime::{SessionRuntime, SessionRuntimeConfig};
pub use session_store::SessionStore;
pub use suggestion_service::{
    SuggestionConfig, SuggestionOutcome, SuggestionService, SuggestionSnapshot,
};
