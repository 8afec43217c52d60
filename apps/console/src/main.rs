//! Harvestgate console session runner.

#![forbid(unsafe_code)]

mod console_config;

use std::sync::Arc;

use harvestgate_application::{
    LoginCredentials, RouteLocator, SessionClientConfig, SessionRuntime, SessionRuntimeConfig,
    SuggestionConfig, SuggestionOutcome, SuggestionService,
};
use harvestgate_core::{AppError, AppResult};
use harvestgate_domain::{GuardOutcome, RouteGuard, Surface};
use harvestgate_infrastructure::{
    FileSessionStorage, HttpSuggestionBackend, InMemoryRouteLocator, ReqwestHttpTransport,
};
use tracing::{info, warn};

use crate::console_config::{ConsoleConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ConsoleConfig::load()?;
    let transport = ReqwestHttpTransport::new(config.api_base_url.clone(), config.http_timeout)?;
    let storage = FileSessionStorage::open(config.storage_path.clone())?;
    let locator = Arc::new(InMemoryRouteLocator::new(config.route.clone()));

    let mut runtime = SessionRuntime::new(
        Arc::new(transport),
        Arc::new(storage),
        locator.clone(),
        SessionRuntimeConfig {
            client: SessionClientConfig {
                refresh_cooldown: config.refresh_cooldown,
                ..SessionClientConfig::default()
            },
            reconcile_interval: config.reconcile_interval,
            ..SessionRuntimeConfig::default()
        },
    );

    info!(
        api_base_url = %config.api_base_url,
        storage_path = %config.storage_path.display(),
        route = %config.route,
        hydrated = runtime.store().snapshot().is_authenticated(),
        "harvestgate-console started"
    );

    if let Err(error) = sign_in(&runtime, &config).await {
        warn!(error = %error, message = %error.user_message(), "sign-in failed");
    }

    runtime.start_reconcile();
    report_route(&runtime, &config.route);

    if let Some(query) = config.search_query.as_deref() {
        search(&runtime, query).await;
    }

    let mut session_changes = runtime.store().subscribe();
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(error) = signal {
                    warn!(error = %error, "failed to listen for shutdown signal");
                }
                break;
            }
            changed = session_changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = session_changes.borrow_and_update().clone();
                info!(
                    authenticated = session.is_authenticated(),
                    loading = session.is_loading(),
                    permissions = session.permissions().len(),
                    "session changed"
                );
                if !session.is_authenticated() && !session.is_loading() {
                    report_route(&runtime, &locator.current_path());
                }
            }
        }
    }

    if config.logout_on_exit {
        runtime.auth().logout().await;
    }
    runtime.dispose().await;
    info!("harvestgate-console stopped");

    Ok(())
}

async fn sign_in(runtime: &SessionRuntime, config: &ConsoleConfig) -> AppResult<()> {
    if let Some(credentials) = &config.credentials {
        let credentials =
            LoginCredentials::new(credentials.email.as_str(), credentials.password.as_str())?;
        let session = runtime.auth().login(&credentials).await?;
        info!(
            user = session.user().map(|user| user.name()).unwrap_or_default(),
            "signed in with password"
        );
    } else if let Some(code) = config.sso_code.as_deref() {
        let session = runtime.auth().login_with_sso(code).await?;
        info!(
            user = session.user().map(|user| user.name()).unwrap_or_default(),
            "signed in with SSO"
        );
    }

    Ok(())
}

fn report_route(runtime: &SessionRuntime, route: &str) {
    let gate = runtime.gate();
    let login_path = gate.routes().login_path.as_str();
    let outcome = match route_guard(route, login_path, gate.is_public_path(route)) {
        Some(guard) => gate.guard(&guard, route),
        None => GuardOutcome::Allow,
    };

    match outcome {
        GuardOutcome::Allow => info!(route = %route, "route allowed"),
        GuardOutcome::Pending => info!(route = %route, "route pending session resolution"),
        GuardOutcome::Redirect(target) => {
            info!(route = %route, target = %target, "route redirected");
        }
    }

    let surfaces = gate
        .accessible_surfaces()
        .iter()
        .map(|surface| surface.path())
        .collect::<Vec<_>>()
        .join(", ");
    info!(surfaces = %surfaces, "accessible surfaces");
}

/// Public routes carry no guard; console surfaces require their capability.
fn route_guard(route: &str, login_path: &str, is_public: bool) -> Option<RouteGuard> {
    let path = route.split(['?', '#']).next().unwrap_or_default();
    if path == login_path {
        return Some(RouteGuard::PublicOnly);
    }
    if is_public {
        return None;
    }

    let guard = Surface::all()
        .iter()
        .filter(|surface| {
            path == surface.path()
                || path
                    .strip_prefix(surface.path())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
        .max_by_key(|surface| surface.path().len())
        .map_or(RouteGuard::Protected, |surface| {
            RouteGuard::PermissionProtected(surface.required_check())
        });

    Some(guard)
}

async fn search(runtime: &SessionRuntime, query: &str) {
    let backend = HttpSuggestionBackend::new(runtime.client().clone());
    let suggestions = SuggestionService::new(
        Arc::new(backend),
        SuggestionConfig {
            debounce: std::time::Duration::ZERO,
            ..SuggestionConfig::default()
        },
    );

    match suggestions.query(query).await {
        Ok(SuggestionOutcome::Applied(items)) => {
            for item in items {
                info!(id = %item.id, title = %item.title, "suggestion");
            }
        }
        Ok(SuggestionOutcome::Superseded) => {}
        Err(error) => warn!(error = %error, message = %error.user_message(), "search failed"),
    }
}
