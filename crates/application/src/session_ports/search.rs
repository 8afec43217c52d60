use async_trait::async_trait;
use harvestgate_core::AppResult;
use harvestgate_domain::Suggestion;

/// Port for the search-suggestion backend.
#[async_trait]
pub trait SuggestionBackend: Send + Sync {
    /// Returns at most `limit` suggestions for a partial query.
    ///
    /// Dropping the returned future cancels the request.
    async fn suggest(&self, query: &str, limit: usize) -> AppResult<Vec<Suggestion>>;
}
