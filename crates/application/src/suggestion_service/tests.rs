use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use harvestgate_core::{AppError, AppResult, RecordKey};
use harvestgate_domain::Suggestion;
use tokio::sync::Mutex;

use super::{SuggestionConfig, SuggestionOutcome, SuggestionService};
use crate::SuggestionBackend;

#[derive(Default)]
struct FakeSuggestionBackend {
    delays: HashMap<String, Duration>,
    failing: Vec<String>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl FakeSuggestionBackend {
    fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_owned(), delay);
        self
    }

    fn failing_on(mut self, query: &str) -> Self {
        self.failing.push(query.to_owned());
        self
    }
}

#[async_trait]
impl SuggestionBackend for FakeSuggestionBackend {
    async fn suggest(&self, query: &str, limit: usize) -> AppResult<Vec<Suggestion>> {
        self.queries.lock().await.push((query.to_owned(), limit));
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.iter().any(|failing| failing == query) {
            return Err(AppError::Upstream {
                status: 500,
                message: "search index unavailable".to_owned(),
            });
        }

        Ok((1..=12)
            .map(|index| Suggestion {
                id: RecordKey::new(index.to_string()),
                title: format!("{query} {index}"),
            })
            .collect())
    }
}

fn titles(outcome: &AppResult<SuggestionOutcome>) -> Vec<String> {
    match outcome {
        Ok(SuggestionOutcome::Applied(items)) => {
            items.iter().map(|item| item.title.clone()).collect()
        }
        other => panic!("expected applied suggestions, got {other:?}"),
    }
}

fn undebounced() -> SuggestionConfig {
    SuggestionConfig {
        debounce: Duration::ZERO,
        ..SuggestionConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn slow_stale_response_never_overwrites_newer_one() {
    let backend = Arc::new(
        FakeSuggestionBackend::default().with_delay("oa", Duration::from_millis(500)),
    );
    let service = SuggestionService::new(backend, undebounced());

    let (stale, fresh) = tokio::join!(service.query("oa"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        service.query("oak").await
    });

    assert_eq!(stale, Ok(SuggestionOutcome::Superseded));
    assert_eq!(titles(&fresh)[0], "oak 1");

    let snapshot = service.snapshot();
    assert_eq!(snapshot.query, "oak");
    assert_eq!(snapshot.sequence, 2);
}

#[tokio::test(start_paused = true)]
async fn debounce_skips_backend_for_superseded_input() {
    let backend = Arc::new(FakeSuggestionBackend::default());
    let service = SuggestionService::new(backend.clone(), SuggestionConfig::default());

    let (first, second) = tokio::join!(service.query("wi"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        service.query("willow").await
    });

    assert_eq!(first, Ok(SuggestionOutcome::Superseded));
    assert_eq!(titles(&second).len(), 8);
    assert_eq!(
        *backend.queries.lock().await,
        vec![("willow".to_owned(), 8)]
    );
}

#[tokio::test(start_paused = true)]
async fn short_input_publishes_empty_list_without_backend() {
    let backend = Arc::new(FakeSuggestionBackend::default());
    let service = SuggestionService::new(backend.clone(), undebounced());
    assert!(service.query("birch").await.is_ok());

    let outcome = service.query(" b ").await;

    assert_eq!(outcome, Ok(SuggestionOutcome::Applied(Vec::new())));
    assert!(service.snapshot().items.is_empty());
    assert_eq!(backend.queries.lock().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failure_of_latest_query_is_reported_and_keeps_previous_list() {
    let backend = Arc::new(FakeSuggestionBackend::default().failing_on("ash"));
    let service = SuggestionService::new(backend, undebounced());
    assert!(service.query("elm").await.is_ok());

    let outcome = service.query("ash").await;

    assert!(matches!(outcome, Err(AppError::Upstream { status: 500, .. })));
    assert_eq!(service.snapshot().query, "elm");
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_applied_lists() {
    let backend = Arc::new(FakeSuggestionBackend::default());
    let service = SuggestionService::new(backend, undebounced());
    let mut receiver = service.subscribe();

    assert!(service.query("maple").await.is_ok());

    assert!(receiver.changed().await.is_ok());
    assert_eq!(receiver.borrow().items.len(), 8);
}
