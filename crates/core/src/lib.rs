//! Shared primitives for all Rust crates in Harvestgate.

#![forbid(unsafe_code)]

/// Authenticated identity primitives shared across crates.
pub mod auth;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{RecordKey, SessionUser};

/// Result type used across Harvestgate crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Structured field-level validation errors returned by the backend.
///
/// Field names are opaque here; callers map them onto their own inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    /// Summary message supplied by the backend.
    #[serde(default)]
    pub message: String,
    /// Messages keyed by field name.
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

/// Common application error categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Backend rejected the payload with field-level errors.
    #[error("validation failed: {}", .0.message)]
    FieldValidation(FieldErrors),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but inactive or blocked by policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No response could be obtained from the server.
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a status outside the categories above.
    #[error("upstream error {status}: {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns whether the server confirmed the session is no longer valid.
    ///
    /// Only these errors may clear local session state; transport failures
    /// and server errors never do.
    #[must_use]
    pub fn confirms_invalid_session(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::NotFound(_))
    }

    /// Returns whether the error came from the transport rather than a response.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns the message shown to end users for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(_) => "Your session has expired. Please log in again.".to_owned(),
            Self::Forbidden(_) => {
                "Your account is inactive or not allowed to perform this action. Contact an administrator."
                    .to_owned()
            }
            Self::Network(_) => {
                "The server could not be reached. Check your connection and try again.".to_owned()
            }
            Self::FieldValidation(errors) if !errors.message.is_empty() => errors.message.clone(),
            Self::FieldValidation(_) => "Some fields are invalid.".to_owned(),
            Self::NotFound(_) => "The requested item could not be found.".to_owned(),
            Self::Validation(message) => message.clone(),
            Self::Upstream { .. } | Self::Internal(_) => {
                "Something went wrong. Please try again later.".to_owned()
            }
        }
    }
}
