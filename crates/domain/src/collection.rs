use harvestgate_core::RecordKey;
use serde::{Deserialize, Serialize};

/// One page of a backend collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// One-based index of this page.
    pub current_page: u32,
    /// Index of the last page.
    pub last_page: u32,
    /// Total item count across pages.
    pub total: u64,
    /// Index of the last item on this page; absent for empty pages.
    #[serde(default)]
    pub to: Option<u64>,
    /// Page size requested from the backend.
    pub per_page: u32,
}

impl<T> Paginated<T> {
    /// Returns whether another page follows this one.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.current_page < self.last_page
    }

    /// Returns the next page index, if any.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        self.has_next_page().then(|| self.current_page + 1)
    }
}

/// Autocomplete entry from the search index.
///
/// Numeric ids are normalised to strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Resource identifier.
    pub id: RecordKey,
    /// Resource title.
    pub title: String,
}
