use async_trait::async_trait;
use harvestgate_core::{AppError, AppResult};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

/// Outbound request descriptor.
///
/// Paths are relative to the API base URL. The descriptor is cloneable so
/// it can be replayed after a session refresh.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    id: Uuid,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Value>,
    retried: bool,
}

impl HttpRequest {
    /// Creates a request without query, headers or body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    /// Creates a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets a header, replacing earlier values with the same name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes a value into the JSON body.
    pub fn with_json_body<T>(self, body: &T) -> AppResult<Self>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(|error| {
            AppError::Internal(format!("failed to encode request body: {error}"))
        })?;

        Ok(self.with_json(body))
    }

    /// Returns the correlation id used in logs.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path relative to the API base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the query parameters in insertion order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns whether the request already went through a refresh retry.
    #[must_use]
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}

/// Response as seen by the session client.
///
/// Empty bodies are represented as `Value::Null`; non-JSON bodies as a
/// JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    status: StatusCode,
    body: Value,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the decoded body.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Returns the backend `message` field, if present.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Decodes the body into a typed value.
    pub fn json<T>(self) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self.body).map_err(|error| {
            AppError::Internal(format!("failed to decode response body: {error}"))
        })
    }
}

/// Port for the raw HTTP transport underneath the session client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one request.
    ///
    /// Returns `Err(AppError::Network)` only when no response was obtained;
    /// every status code, including errors, comes back as `Ok`.
    async fn send(&self, request: &HttpRequest) -> AppResult<HttpResponse>;
}
