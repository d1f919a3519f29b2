//! Shared decoding of Google API error bodies.

use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

/// Formats a non-success response as `STATUS_TEXT: message`, falling back
/// to the raw body when it is not the standard error shape.
///
/// The service's own wording is preserved verbatim; moderation blocks keep
/// their `SAFETY` marker so callers can recognize them.
pub(crate) fn service_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let status_text = wrapper.error.status.unwrap_or_default();
            let message = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                message
            } else {
                format!("{status_text}: {message}")
            }
        }
        Err(_) => format!("HTTP {}: {}", status.as_u16(), body),
    }
}
