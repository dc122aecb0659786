//! Client error types

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::message::normalize_error_message;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, FetchError>;

/// Error type produced by application-supplied collaborators (hooks, refreshers, transports)
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Application code used when the server does not supply one
pub const DEFAULT_ERROR_CODE: &str = "HTTP_ERROR";

const FALLBACK_MESSAGE: &str = "Request failed";

/// A finalized non-2xx response
///
/// Built once the request is definitely failing, i.e. after the refresh
/// retry if one was attempted.
#[derive(Debug, Clone, Error)]
#[error("HTTP {status}: {message}")]
pub struct ClientError {
    /// Response status
    pub status: StatusCode,
    /// Application error code from the body, or [`DEFAULT_ERROR_CODE`]
    pub code: String,
    /// Normalized, human readable message
    pub message: String,
    /// Parsed response body (`Null` when empty or not JSON)
    pub data: Value,
}

impl ClientError {
    /// Build an error from a failed response.
    ///
    /// The message is taken from the body's `message` field, then its `error`
    /// field, then the status text, and is normalized before being stored.
    pub fn from_response(status: StatusCode, status_text: &str, data: Value) -> Self {
        let raw = text_field(&data, "message")
            .or_else(|| text_field(&data, "error"))
            .or_else(|| Some(status_text).filter(|s| !s.is_empty()))
            .unwrap_or(FALLBACK_MESSAGE);
        let message = normalize_error_message(raw);
        let code = text_field(&data, "code")
            .unwrap_or(DEFAULT_ERROR_CODE)
            .to_string();

        Self {
            status,
            code,
            message,
            data,
        }
    }
}

fn text_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// Transport-level failures, passed through uncategorized
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network request failed
    #[error("Network request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The resolved URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failure raised by a custom transport
    #[error("Transport failed: {0}")]
    Other(BoxError),
}

/// Errors returned by client calls
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx response
    #[error(transparent)]
    Http(#[from] ClientError),

    /// Transport failure (network unreachable, DNS, ...)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A before-request or after-response hook aborted the request
    #[error("Request hook failed: {0}")]
    Hook(BoxError),

    /// Request body could not be serialized
    #[error("Failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Response body did not match the requested type
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// A header value could not be encoded
    #[error("Invalid value for header {0}")]
    InvalidHeader(String),

    /// Invalid proxy configuration
    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),
}

impl FetchError {
    /// Response status, when the failure came from an HTTP response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Http(e) => Some(e.status),
            FetchError::Transport(TransportError::Request(e)) => e.status(),
            _ => None,
        }
    }

    /// Application error code, when the failure came from an HTTP response
    pub fn code(&self) -> Option<&str> {
        match self {
            FetchError::Http(e) => Some(e.code.as_str()),
            _ => None,
        }
    }

    /// The finalized HTTP error, if any
    pub fn as_client_error(&self) -> Option<&ClientError> {
        match self {
            FetchError::Http(e) => Some(e),
            _ => None,
        }
    }

    /// Check if the request ended with 401 Unauthorized
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_message_prefers_body_message() {
        let err = ClientError::from_response(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            json!({"message": "Invalid credentials", "error": "Unauthorized"}),
        );
        assert_eq!(err.message, "Invalid credentials");
        assert_eq!(err.code, DEFAULT_ERROR_CODE);
    }

    #[test]
    fn test_message_falls_back_to_error_then_status_text() {
        let err = ClientError::from_response(
            StatusCode::FORBIDDEN,
            "Forbidden",
            json!({"error": "No access"}),
        );
        assert_eq!(err.message, "No access");

        let err = ClientError::from_response(StatusCode::FORBIDDEN, "Forbidden", Value::Null);
        assert_eq!(err.message, "Forbidden");

        let err = ClientError::from_response(StatusCode::FORBIDDEN, "", Value::Null);
        assert_eq!(err.message, "Request failed");
    }

    #[test]
    fn test_server_code_and_body_are_kept() {
        let body = json!({"message": "body/pwd too short", "code": "VALIDATION"});
        let err = ClientError::from_response(StatusCode::BAD_REQUEST, "Bad Request", body.clone());
        assert_eq!(err.code, "VALIDATION");
        assert_eq!(err.message, "Password too short");
        assert_eq!(err.data, body);
        assert_eq!(err.to_string(), "HTTP 400 Bad Request: Password too short");
    }

    #[test]
    fn test_fetch_error_accessors() {
        let err: FetchError =
            ClientError::from_response(StatusCode::UNAUTHORIZED, "Unauthorized", Value::Null).into();
        assert!(err.is_unauthorized());
        assert_eq!(err.code(), Some(DEFAULT_ERROR_CODE));
        assert!(err.as_client_error().is_some());

        let err = FetchError::Hook("denied".into());
        assert_eq!(err.status(), None);
        assert_eq!(err.code(), None);
        assert!(!err.is_unauthorized());
    }
}
