//! Raw transport responses and their parsed form

use reqwest::{header::HeaderMap, StatusCode};
use serde_json::Value;

/// Response as returned by a [`Transport`](crate::Transport)
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    /// Body text; empty when the response had none
    pub body: String,
}

impl RawResponse {
    /// Response with the canonical status text
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Parsed response
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    /// JSON body, `Null` when empty or unparsable
    pub data: Value,
}

impl ResponseEnvelope {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl From<RawResponse> for ResponseEnvelope {
    fn from(raw: RawResponse) -> Self {
        Self {
            status: raw.status,
            status_text: raw.status_text,
            headers: raw.headers,
            data: parse_body(&raw.body),
        }
    }
}

/// Parse a body as JSON, yielding `Null` for empty or invalid input
pub fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or(Value::Null)
}
