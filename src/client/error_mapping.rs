//! Classification of storage API failures into semantic `ApiError` variants.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use super::types::ApiErrorBody;
use crate::error::ApiError;

/// Map a non-success status and its body to an `ApiError`.
///
/// The provider's JSON error payload is decoded when possible so the message
/// carries the error code and request id; otherwise the raw body is used.
pub(super) fn classify_status(status: StatusCode, headers: &HeaderMap, body: &str) -> ApiError {
    let message = render_message(status, body);

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound { message },
        StatusCode::CONFLICT => ApiError::Conflict { message },
        StatusCode::BAD_REQUEST
        | StatusCode::METHOD_NOT_ALLOWED
        | StatusCode::PRECONDITION_FAILED
        | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation { message },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth { message },
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimit {
            retry_after_secs: retry_after_secs(headers),
            message,
        },
        other => ApiError::UnexpectedStatus {
            status: other.as_u16(),
            message,
        },
    }
}

/// Convert a transport-level `reqwest` failure.
pub(super) fn transport_error(error: &reqwest::Error) -> ApiError {
    ApiError::Transport {
        message: error.to_string(),
    }
}

fn render_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).unwrap_or_default();

    let text = match (parsed.code, parsed.message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (None, Some(message)) => message,
        (Some(code), None) => code,
        (None, None) if body.trim().is_empty() => status.to_string(),
        (None, None) => body.trim().to_owned(),
    };

    match parsed.request_id {
        Some(request_id) => format!("{text} (request id {request_id})"),
        None => text,
    }
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}
