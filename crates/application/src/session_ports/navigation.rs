/// Port exposing where the hosting UI currently is.
pub trait RouteLocator: Send + Sync {
    /// Returns the current route path, e.g. `/harvests/12`.
    fn current_path(&self) -> String;
}
