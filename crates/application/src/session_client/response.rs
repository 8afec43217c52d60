use harvestgate_core::{AppError, AppResult, FieldErrors};
use http::StatusCode;

use crate::HttpResponse;

/// Maps a raw response onto success or an `AppError` category.
pub(crate) fn interpret_response(response: HttpResponse) -> AppResult<HttpResponse> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .message()
        .map(str::to_owned)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_owned()
        });

    Err(match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::UNPROCESSABLE_ENTITY => AppError::FieldValidation(
            serde_json::from_value::<FieldErrors>(response.body().clone())
                .map(|errors| FieldErrors {
                    message: if errors.message.is_empty() {
                        message.clone()
                    } else {
                        errors.message
                    },
                    errors: errors.errors,
                })
                .unwrap_or_else(|_| FieldErrors {
                    message,
                    errors: Default::default(),
                }),
        ),
        _ => AppError::Upstream {
            status: status.as_u16(),
            message,
        },
    })
}
