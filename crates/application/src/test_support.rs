use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use harvestgate_core::{AppError, AppResult};
use http::StatusCode;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::{
    HttpRequest, HttpResponse, HttpTransport, RouteLocator, SessionClient, SessionClientConfig,
    SessionStorage, SessionStore,
};

pub(crate) fn session_payload_json() -> Value {
    json!({
        "user": {"id": 1, "name": "Ana", "email": "ana@example.org"},
        "roles": [{"name": "curator", "permissions": ["resources.read"]}],
        "permissions": ["harvests.read"]
    })
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum RefreshBehavior {
    Succeed,
    Reject(StatusCode),
    NetworkDown,
    /// The transport panics, killing the refresh task.
    Crash,
}

/// Scripted backend: protected paths answer `401` until a refresh succeeds.
pub(crate) struct FakeTransport {
    refresh_behavior: Mutex<RefreshBehavior>,
    refresh_payload: Mutex<Value>,
    refresh_delay: Duration,
    authorized: AtomicBool,
    fail_logout: AtomicBool,
    refresh_calls: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub(crate) fn new(refresh_behavior: RefreshBehavior) -> Self {
        Self {
            refresh_behavior: Mutex::new(refresh_behavior),
            refresh_payload: Mutex::new(session_payload_json()),
            refresh_delay: Duration::from_millis(50),
            authorized: AtomicBool::new(false),
            fail_logout: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn authorized(self) -> Self {
        self.authorized.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn set_authorized(&self, authorized: bool) {
        self.authorized.store(authorized, Ordering::SeqCst);
    }

    pub(crate) fn fail_logout(&self) {
        self.fail_logout.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn set_refresh_behavior(&self, behavior: RefreshBehavior) {
        *self.refresh_behavior.lock().await = behavior;
    }

    pub(crate) async fn set_refresh_payload(&self, payload: Value) {
        *self.refresh_payload.lock().await = payload;
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn refresh(&self) -> AppResult<HttpResponse> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.refresh_delay).await;

        match *self.refresh_behavior.lock().await {
            RefreshBehavior::Succeed => {
                self.authorized.store(true, Ordering::SeqCst);
                let payload = self.refresh_payload.lock().await.clone();
                Ok(HttpResponse::new(StatusCode::OK, payload))
            }
            RefreshBehavior::Reject(status) => {
                self.authorized.store(false, Ordering::SeqCst);
                Ok(HttpResponse::new(
                    status,
                    json!({"message": "Session expired"}),
                ))
            }
            RefreshBehavior::NetworkDown => {
                Err(AppError::Network("connection refused".to_owned()))
            }
            RefreshBehavior::Crash => panic!("refresh backend crashed"),
        }
    }

    fn login(&self, body: Option<&Value>) -> HttpResponse {
        let password = body
            .and_then(|body| body.get("password"))
            .and_then(Value::as_str);

        if password == Some("secret") {
            self.authorized.store(true, Ordering::SeqCst);
            HttpResponse::new(StatusCode::OK, session_payload_json())
        } else {
            HttpResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "message": "These credentials do not match our records.",
                    "errors": {"email": ["These credentials do not match our records."]}
                }),
            )
        }
    }

    fn sso_exchange(&self, body: Option<&Value>) -> HttpResponse {
        let code = body.and_then(|body| body.get("code")).and_then(Value::as_str);

        if code == Some("valid-code") {
            self.authorized.store(true, Ordering::SeqCst);
            HttpResponse::new(StatusCode::OK, session_payload_json())
        } else {
            HttpResponse::new(
                StatusCode::UNAUTHORIZED,
                json!({"message": "Invalid or expired code"}),
            )
        }
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: &HttpRequest) -> AppResult<HttpResponse> {
        self.calls.lock().await.push(request.path().to_owned());

        match request.path() {
            "/api/refresh" => self.refresh().await,
            "/api/login" => Ok(self.login(request.body())),
            "/api/auth/sso/exchange" => Ok(self.sso_exchange(request.body())),
            "/api/logout" if self.fail_logout.load(Ordering::SeqCst) => {
                Err(AppError::Network("connection reset".to_owned()))
            }
            "/api/logout" => {
                self.authorized.store(false, Ordering::SeqCst);
                Ok(HttpResponse::new(StatusCode::NO_CONTENT, Value::Null))
            }
            "/api/offline" => Err(AppError::Network("connection refused".to_owned())),
            path if path.starts_with("/api/locked") => Ok(HttpResponse::new(
                StatusCode::UNAUTHORIZED,
                json!({"message": "Unauthenticated."}),
            )),
            path if self.authorized.load(Ordering::SeqCst) => Ok(HttpResponse::new(
                StatusCode::OK,
                json!({"path": path}),
            )),
            _ => Ok(HttpResponse::new(
                StatusCode::UNAUTHORIZED,
                json!({"message": "Unauthenticated."}),
            )),
        }
    }
}

#[derive(Default)]
pub(crate) struct MemoryStorage {
    values: std::sync::Mutex<HashMap<String, String>>,
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| AppError::Internal("memory storage lock poisoned".to_owned()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| AppError::Internal("memory storage lock poisoned".to_owned()))?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| AppError::Internal("memory storage lock poisoned".to_owned()))?;
        values.remove(key);
        Ok(())
    }
}

pub(crate) struct FixedLocator {
    path: std::sync::Mutex<String>,
}

impl FixedLocator {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: std::sync::Mutex::new(path.to_owned()),
        }
    }

    pub(crate) fn navigate(&self, path: &str) {
        if let Ok(mut current) = self.path.lock() {
            *current = path.to_owned();
        }
    }
}

impl RouteLocator for FixedLocator {
    fn current_path(&self) -> String {
        self.path
            .lock()
            .map(|path| path.clone())
            .unwrap_or_default()
    }
}

pub(crate) struct Harness {
    pub(crate) transport: Arc<FakeTransport>,
    pub(crate) storage: Arc<MemoryStorage>,
    pub(crate) client: SessionClient,
}

impl Harness {
    pub(crate) fn new(transport: FakeTransport) -> Self {
        let transport = Arc::new(transport);
        let storage = Arc::new(MemoryStorage::default());
        let store = SessionStore::hydrate(storage.clone());
        let client = SessionClient::new(
            transport.clone(),
            store,
            SessionClientConfig::default(),
        );

        Self {
            transport,
            storage,
            client,
        }
    }

    /// Starts from a session hydrated out of storage, as after a restart.
    pub(crate) fn signed_in(transport: FakeTransport) -> Self {
        let harness = Self::new(transport);
        let payload = match serde_json::from_value(session_payload_json()) {
            Ok(payload) => payload,
            Err(error) => panic!("fixture payload should parse: {error}"),
        };
        harness.client.store().apply_payload(&payload);
        harness
    }

    pub(crate) fn store(&self) -> &SessionStore {
        self.client.store()
    }
}
