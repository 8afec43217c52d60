//! Debounced autocomplete that never lets an older response overwrite a
//! newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use harvestgate_core::AppResult;
use harvestgate_domain::Suggestion;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::SuggestionBackend;

#[cfg(test)]
mod tests;

/// Autocomplete tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionConfig {
    /// Quiet period before the backend is queried. Zero disables debouncing.
    pub debounce: Duration,
    /// Minimum trimmed input length, in characters, that reaches the backend.
    pub min_chars: usize,
    /// Maximum number of suggestions kept.
    pub limit: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            min_chars: 2,
            limit: 8,
        }
    }
}

/// Latest applied suggestion list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionSnapshot {
    /// Sequence number of the input that produced this list.
    pub sequence: u64,
    /// Trimmed query.
    pub query: String,
    /// Suggestions in backend order.
    pub items: Vec<Suggestion>,
}

/// Outcome of one query call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    /// Results were published.
    Applied(Vec<Suggestion>),
    /// A newer input arrived; nothing was published.
    Superseded,
}

/// Autocomplete service over a suggestion backend.
#[derive(Clone)]
pub struct SuggestionService {
    inner: Arc<SuggestionServiceInner>,
}

struct SuggestionServiceInner {
    backend: Arc<dyn SuggestionBackend>,
    config: SuggestionConfig,
    latest: AtomicU64,
    snapshot: watch::Sender<SuggestionSnapshot>,
}

impl SuggestionService {
    /// Creates a suggestion service.
    #[must_use]
    pub fn new(backend: Arc<dyn SuggestionBackend>, config: SuggestionConfig) -> Self {
        let (snapshot, _) = watch::channel(SuggestionSnapshot::default());

        Self {
            inner: Arc::new(SuggestionServiceInner {
                backend,
                config,
                latest: AtomicU64::new(0),
                snapshot,
            }),
        }
    }

    /// Subscribes to applied suggestion lists.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SuggestionSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Returns the latest applied suggestion list.
    #[must_use]
    pub fn snapshot(&self) -> SuggestionSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Handles one input change.
    ///
    /// Backend errors for an input that has since been superseded are
    /// swallowed; only the latest input reports failures.
    pub async fn query(&self, input: &str) -> AppResult<SuggestionOutcome> {
        let sequence = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let query = input.trim();
        let config = &self.inner.config;

        if query.chars().count() < config.min_chars {
            self.publish(sequence, query, Vec::new());
            return Ok(SuggestionOutcome::Applied(Vec::new()));
        }

        if !config.debounce.is_zero() {
            tokio::time::sleep(config.debounce).await;
            if self.is_superseded(sequence) {
                debug!(sequence, "suggestion input superseded during debounce");
                return Ok(SuggestionOutcome::Superseded);
            }
        }

        let result = self.inner.backend.suggest(query, config.limit).await;
        if self.is_superseded(sequence) {
            debug!(sequence, "discarding stale suggestion response");
            return Ok(SuggestionOutcome::Superseded);
        }

        let mut items = result.inspect_err(|error| {
            warn!(sequence, error = %error, "suggestion lookup failed");
        })?;
        items.truncate(config.limit);
        self.publish(sequence, query, items.clone());

        Ok(SuggestionOutcome::Applied(items))
    }

    fn is_superseded(&self, sequence: u64) -> bool {
        self.inner.latest.load(Ordering::SeqCst) != sequence
    }

    fn publish(&self, sequence: u64, query: &str, items: Vec<Suggestion>) {
        self.inner.snapshot.send_if_modified(|current| {
            if current.sequence > sequence {
                return false;
            }

            *current = SuggestionSnapshot {
                sequence,
                query: query.to_owned(),
                items,
            };
            true
        });
    }
}
