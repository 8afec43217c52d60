use std::sync::RwLock;

use harvestgate_application::RouteLocator;
use tracing::debug;

/// Route locator for hosts without a browser history, driven by `navigate`.
pub struct InMemoryRouteLocator {
    path: RwLock<String>,
}

impl InMemoryRouteLocator {
    /// Creates a locator positioned at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: RwLock::new(path.into()),
        }
    }

    /// Moves to another route.
    pub fn navigate(&self, path: impl Into<String>) {
        let path = path.into();
        debug!(path = %path, "navigated");
        match self.path.write() {
            Ok(mut current) => *current = path,
            Err(poisoned) => *poisoned.into_inner() = path,
        }
    }
}

impl RouteLocator for InMemoryRouteLocator {
    fn current_path(&self) -> String {
        match self.path.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use harvestgate_application::RouteLocator;

    use super::InMemoryRouteLocator;

    #[test]
    fn navigate_moves_current_path() {
        let locator = InMemoryRouteLocator::new("/dashboard");

        locator.navigate("/harvests/3");

        assert_eq!(locator.current_path(), "/harvests/3");
    }
}
