//! Request building
//!
//! Turns a [`RequestSpec`] (method, endpoint, optional body, per-call options)
//! into a [`PreparedRequest`] ready for the transport: JSON body and content
//! type, bearer token, and resolved credentials mode.

use std::{fmt, sync::Arc};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{FetchError, Result},
    logging::Logger,
    token::TokenStore,
};

/// HTTP verbs supported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
        }
    }

    /// Equivalent reqwest method
    pub fn to_method(self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials mode, mirroring the fetch `credentials` option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

impl Credentials {
    pub fn as_str(&self) -> &'static str {
        match self {
            Credentials::Omit => "omit",
            Credentials::SameOrigin => "same-origin",
            Credentials::Include => "include",
        }
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call overrides
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers; `Authorization` is always replaced when a token is available
    pub headers: HeaderMap,
    /// Overrides the client-wide credentials mode
    pub credentials: Option<Credentials>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the credentials mode for this call
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// One logical call, kept intact so it can be rebuilt for the retry
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: RequestMethod,
    pub endpoint: String,
    /// JSON body; `None` also covers bodies that serialize to `null`
    pub body: Option<Value>,
    pub options: RequestOptions,
}

impl RequestSpec {
    pub fn new(method: RequestMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    /// Attach a body.
    ///
    /// Serialization errors are returned as [`FetchError::Serialize`].
    pub fn with_body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(FetchError::Serialize)?;
        self.body = Some(value).filter(|v| !v.is_null());
        Ok(self)
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Fully specified request descriptor handed to hooks and the transport
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: RequestMethod,
    pub url: String,
    pub headers: HeaderMap,
    /// Serialized JSON body
    pub body: Option<String>,
    pub credentials: Credentials,
}

impl fmt::Display for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.headers.keys().map(|k| k.as_str()).collect();
        write!(
            f,
            "{} {} (headers: [{}], credentials: {}, body: {} bytes)",
            self.method,
            self.url,
            names.join(", "),
            self.credentials,
            self.body.as_ref().map_or(0, String::len)
        )
    }
}

/// Builds [`PreparedRequest`]s for one client
#[derive(Clone)]
pub struct RequestBuilder {
    tokens: Option<Arc<dyn TokenStore>>,
    default_credentials: Option<Credentials>,
    logger: Arc<dyn Logger>,
}

impl RequestBuilder {
    pub fn new(
        tokens: Option<Arc<dyn TokenStore>>,
        default_credentials: Option<Credentials>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            tokens,
            default_credentials,
            logger,
        }
    }

    /// Build the descriptor for `spec`, targeting the already resolved `url`.
    ///
    /// The token is read from the store on every call.
    pub fn build(&self, spec: &RequestSpec, url: impl Into<String>) -> Result<PreparedRequest> {
        let mut headers = spec.options.headers.clone();

        let body = match (&spec.body, spec.method) {
            (Some(body), method) if method != RequestMethod::Get => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(body.to_string())
            }
            _ => None,
        };

        if let Some(token) = self.current_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| FetchError::InvalidHeader(AUTHORIZATION.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let credentials = spec
            .options
            .credentials
            .or(self.default_credentials)
            .unwrap_or_default();

        let request = PreparedRequest {
            method: spec.method,
            url: url.into(),
            headers,
            body,
            credentials,
        };
        self.logger.debug(&format!("Prepared {request}"));
        Ok(request)
    }

    fn current_token(&self) -> Option<String> {
        self.tokens
            .as_ref()
            .and_then(|store| store.token())
            .filter(|token| !token.is_empty())
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("has_token_store", &self.tokens.is_some())
            .field("default_credentials", &self.default_credentials)
            .finish()
    }
}
