//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod file_session_storage;
mod http_suggestion_backend;
mod in_memory_route_locator;
mod in_memory_session_storage;
mod reqwest_http_transport;

pub use file_session_storage::FileSessionStorage;
pub use http_suggestion_backend::{DEFAULT_SUGGESTION_PATH, HttpSuggestionBackend};
pub use in_memory_route_locator::InMemoryRouteLocator;
pub use in_memory_session_storage::InMemorySessionStorage;
pub use reqwest_http_transport::ReqwestHttpTransport;
