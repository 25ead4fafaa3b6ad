//! Error types for the songs API client.
//!
//! # Design
//! Every failure of a client call collapses into one `ApiError` value; nothing
//! escapes as a panic. `NotFound` gets a dedicated variant because callers
//! distinguish "the song does not exist" from other rejections. All other
//! non-2xx responses land in `Http` with a human-readable message taken from
//! the response body when the server provides one.

use serde_json::Value;
use thiserror::Error;

use crate::http::HttpResponse;

/// Errors returned by `SongClient` and `SongApi`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response: connection refused, DNS
    /// failure, timeout.
    #[error("network error: {0}")]
    Transport(String),

    /// The server returned 404. `message` is the server's text when it sent one.
    #[error("{}", .message.as_deref().unwrap_or("song not found"))]
    NotFound { message: Option<String> },

    /// The server returned a non-2xx status other than 404.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("malformed response: {0}")]
    Deserialization(String),

    /// The request payload could not be encoded.
    #[error("failed to encode request: {0}")]
    Serialization(String),

    /// A draft was rejected locally before any request was sent.
    #[error("invalid song: {0}")]
    InvalidDraft(String),
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_response(response: &HttpResponse) -> Self {
        let message = server_message(&response.body);
        if response.status == 404 {
            return ApiError::NotFound { message };
        }
        let message = message.unwrap_or_else(|| format!("Request failed with status code {}", response.status));
        ApiError::Http {
            status: response.status,
            message,
        }
    }

    /// HTTP status behind this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Extract a message from `{"detail": "..."}` or a field-error map such as
/// `{"title": ["This field may not be blank."]}`.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    if let Some(detail) = object.get("detail").and_then(Value::as_str) {
        return Some(detail.to_string());
    }

    let mut parts = Vec::new();
    for (field, errors) in object {
        let text = match errors {
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" "),
            _ => continue,
        };
        if !text.is_empty() {
            parts.push(format!("{field}: {text}"));
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}
