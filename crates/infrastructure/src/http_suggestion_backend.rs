use async_trait::async_trait;
use harvestgate_application::{SessionClient, SuggestionBackend};
use harvestgate_core::AppResult;
use harvestgate_domain::Suggestion;
use serde::Deserialize;

/// Default suggestion endpoint path.
pub const DEFAULT_SUGGESTION_PATH: &str = "/api/search/suggestions";

/// The endpoint answers with a bare list or a `{ "data": [...] }` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestionEnvelope {
    Bare(Vec<Suggestion>),
    Wrapped { data: Vec<Suggestion> },
}

impl SuggestionEnvelope {
    fn into_items(self) -> Vec<Suggestion> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

/// Suggestion backend calling the search API through the session client.
pub struct HttpSuggestionBackend {
    client: SessionClient,
    path: String,
}

impl HttpSuggestionBackend {
    /// Creates a backend hitting [`DEFAULT_SUGGESTION_PATH`].
    #[must_use]
    pub fn new(client: SessionClient) -> Self {
        Self::with_path(client, DEFAULT_SUGGESTION_PATH)
    }

    /// Creates a backend hitting a custom path.
    #[must_use]
    pub fn with_path(client: SessionClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }
}

#[async_trait]
impl SuggestionBackend for HttpSuggestionBackend {
    async fn suggest(&self, query: &str, limit: usize) -> AppResult<Vec<Suggestion>> {
        let limit = limit.to_string();
        let envelope: SuggestionEnvelope = self
            .client
            .get_json(&self.path, &[("q", query), ("limit", limit.as_str())])
            .await?;

        Ok(envelope.into_items())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use harvestgate_application::{
        HttpRequest, HttpResponse, HttpTransport, SessionClient, SessionClientConfig,
        SessionStore, SuggestionBackend,
    };
    use harvestgate_core::{AppResult, RecordKey};
    use http::StatusCode;
    use serde_json::{Value, json};
    use tokio::sync::Mutex;

    use super::HttpSuggestionBackend;
    use crate::InMemorySessionStorage;

    struct ScriptedTransport {
        body: Value,
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: &HttpRequest) -> AppResult<HttpResponse> {
            self.requests.lock().await.push(request.clone());
            Ok(HttpResponse::new(StatusCode::OK, self.body.clone()))
        }
    }

    fn backend(body: Value) -> (HttpSuggestionBackend, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport {
            body,
            requests: Mutex::new(Vec::new()),
        });
        let store = SessionStore::hydrate(Arc::new(InMemorySessionStorage::new()));
        let client = SessionClient::new(transport.clone(), store, SessionClientConfig::default());

        (HttpSuggestionBackend::new(client), transport)
    }

    #[tokio::test]
    async fn accepts_bare_list_with_numeric_ids() {
        let (backend, transport) = backend(json!([{"id": 3, "title": "Oak bark"}]));

        let items = backend.suggest("oak", 8).await;

        let Ok(items) = items else {
            panic!("suggestions should decode");
        };
        assert_eq!(items[0].id, RecordKey::new("3"));
        let requests = transport.requests.lock().await;
        assert_eq!(requests[0].path(), "/api/search/suggestions");
        assert_eq!(
            requests[0].query(),
            &[
                ("q".to_owned(), "oak".to_owned()),
                ("limit".to_owned(), "8".to_owned())
            ]
        );
    }

    #[tokio::test]
    async fn accepts_data_envelope() {
        let (backend, _) = backend(json!({"data": [{"id": "a-1", "title": "Ash seeds"}]}));

        let items = backend.suggest("ash", 5).await;

        assert!(matches!(items, Ok(ref items) if items[0].title == "Ash seeds"));
    }
}
