mod navigation;
mod search;
mod storage;
mod transport;

pub use navigation::RouteLocator;
pub use search::SuggestionBackend;
pub use storage::{
    CONTINUE_TO_STORAGE_KEY, PERMISSIONS_STORAGE_KEY, ROLES_STORAGE_KEY, SessionStorage,
    USER_STORAGE_KEY,
};
pub use transport::{HttpRequest, HttpResponse, HttpTransport};
