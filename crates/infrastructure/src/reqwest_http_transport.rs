use std::time::Duration;

use async_trait::async_trait;
use harvestgate_application::{HttpRequest, HttpResponse, HttpTransport};
use harvestgate_core::{AppError, AppResult};
use http::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::debug;
use url::Url;

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// `reqwest` transport keeping session cookies across calls.
pub struct ReqwestHttpTransport {
    http_client: reqwest::Client,
    base_url: Url,
}

impl ReqwestHttpTransport {
    /// Creates a transport with a cookie store and JSON defaults.
    pub fn new(base_url: Url, timeout: Duration) -> AppResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));

        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Ok(Self::with_client(http_client, base_url))
    }

    /// Creates a transport over a preconfigured client.
    #[must_use]
    pub fn with_client(http_client: reqwest::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            http_client,
            base_url,
        }
    }

    /// Returns the base URL request paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, request: &HttpRequest) -> AppResult<Url> {
        let mut url = self
            .base_url
            .join(request.path().trim_start_matches('/'))
            .map_err(|error| {
                AppError::Validation(format!(
                    "invalid request path '{}': {error}",
                    request.path()
                ))
            })?;

        if !request.query().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query());
        }

        Ok(url)
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: &HttpRequest) -> AppResult<HttpResponse> {
        let url = self.endpoint(request)?;
        let mut builder = self
            .http_client
            .request(request.method().clone(), url)
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| {
            AppError::Network(format!("request to '{}' failed: {error}", request.path()))
        })?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|error| {
            AppError::Network(format!(
                "failed to read response from '{}': {error}",
                request.path()
            ))
        })?;

        debug!(
            request_id = %request.id(),
            method = %request.method(),
            path = %request.path(),
            status = status.as_u16(),
            "http response received"
        );

        Ok(HttpResponse::new(status, decode_body(&bytes)))
    }
}

/// Empty bodies decode to `Null`; non-JSON bodies are kept as text.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }

    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
