//! Mapping of HTTP outcomes onto [`ApiError`]

use reqwest::StatusCode;
use uplinkbridge_domain::ApiError;

/// Classify a non-success response
pub(crate) fn status_error(status: StatusCode, url: &str, body: &str) -> ApiError {
    let message = if body.is_empty() {
        format!("{url} returned status {status}")
    } else {
        format!("{url} returned status {status}: {body}")
    };

    if status == StatusCode::UNAUTHORIZED {
        ApiError::Unauthorized(message)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ApiError::RateLimited
    } else if status.is_server_error() {
        ApiError::Server { status: status.as_u16() }
    } else {
        ApiError::Client { status: status.as_u16(), message }
    }
}

/// Classify a failure to get any response at all
pub(crate) fn transport_error(err: &reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}
