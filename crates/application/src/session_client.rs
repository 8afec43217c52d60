use std::sync::Arc;
use std::time::Duration;

use harvestgate_core::AppResult;
use harvestgate_domain::{Paginated, SessionPayload};
use http::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{HttpRequest, HttpResponse, HttpTransport, SessionStore};

mod refresh;
mod response;

use refresh::RefreshState;
pub(crate) use response::interpret_response;

/// Default window during which a completed refresh is reused.
pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(10);

/// Authentication endpoint paths. Calls to these are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    /// Password login.
    pub login: String,
    /// Logout notification.
    pub logout: String,
    /// Silent session refresh.
    pub refresh: String,
    /// SSO one-time code exchange.
    pub sso_exchange: String,
}

impl AuthEndpoints {
    /// Returns whether the path targets one of the authentication endpoints.
    #[must_use]
    pub fn is_auth_endpoint(&self, path: &str) -> bool {
        let path = normalize_path(path);
        [
            &self.login,
            &self.logout,
            &self.refresh,
            &self.sso_exchange,
        ]
        .into_iter()
        .any(|endpoint| normalize_path(endpoint) == path)
    }
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/api/login".to_owned(),
            logout: "/api/logout".to_owned(),
            refresh: "/api/refresh".to_owned(),
            sso_exchange: "/api/auth/sso/exchange".to_owned(),
        }
    }
}

fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
}

/// Session client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClientConfig {
    /// Authentication endpoint paths.
    pub endpoints: AuthEndpoints,
    /// How long a successful refresh satisfies later refresh requests.
    pub refresh_cooldown: Duration,
}

impl Default for SessionClientConfig {
    fn default() -> Self {
        Self {
            endpoints: AuthEndpoints::default(),
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
        }
    }
}

/// HTTP client decorator owning session refresh and request replay.
///
/// A request rejected with `401` triggers at most one concurrent refresh;
/// requests rejected while it runs are queued and replayed in order once it
/// settles, each exactly once.
#[derive(Clone)]
pub struct SessionClient {
    inner: Arc<SessionClientInner>,
}

struct SessionClientInner {
    transport: Arc<dyn HttpTransport>,
    store: SessionStore,
    config: SessionClientConfig,
    refresh: Mutex<RefreshState>,
}

impl SessionClient {
    /// Creates a session client writing refresh outcomes into the store.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: SessionStore,
        config: SessionClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SessionClientInner {
                transport,
                store,
                config,
                refresh: Mutex::new(RefreshState::Idle),
            }),
        }
    }

    /// Returns the session store this client publishes into.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &SessionClientConfig {
        &self.inner.config
    }

    /// Sends a request, refreshing the session and replaying once on `401`.
    ///
    /// Network failures are returned as-is and never trigger a refresh.
    /// Non-success statuses are mapped onto `AppError` variants.
    pub async fn request(&self, mut request: HttpRequest) -> AppResult<HttpResponse> {
        let response = self.inner.transport.send(&request).await?;

        if response.status() != StatusCode::UNAUTHORIZED
            || request.is_retried()
            || self.inner.config.endpoints.is_auth_endpoint(request.path())
        {
            return interpret_response(response);
        }

        request.mark_retried();
        debug!(
            request_id = %request.id(),
            path = %request.path(),
            "request rejected as unauthenticated; waiting for session refresh"
        );
        self.retry_after_refresh(request).await
    }

    /// Sends a `GET` and decodes the JSON body.
    pub async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let request = query
            .iter()
            .fold(HttpRequest::get(path), |request, (key, value)| {
                request.with_query(*key, *value)
            });

        self.request(request).await?.json()
    }

    /// Sends a JSON body and decodes the JSON response.
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = HttpRequest::new(method, path).with_json_body(body)?;
        self.request(request).await?.json()
    }

    /// Fetches one page of a paginated backend collection.
    pub async fn fetch_page<T>(&self, path: &str, page: u32) -> AppResult<Paginated<T>>
    where
        T: DeserializeOwned,
    {
        let page = page.max(1).to_string();
        self.get_json(path, &[("page", page.as_str())]).await
    }

    /// Renews the session, sharing any in-flight refresh.
    ///
    /// Inside the cooldown after a successful refresh this resolves to the
    /// payload of that refresh without touching the network.
    pub async fn refresh_once(&self) -> AppResult<SessionPayload> {
        self.shared_refresh().await
    }
}
