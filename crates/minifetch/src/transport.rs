//! Transport seam and the reqwest-backed implementation

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    config::TransportConfig,
    error::{FetchError, Result, TransportError},
    request::PreparedRequest,
    response::RawResponse,
};

/// Mockable fetch primitive
///
/// Takes a fully built request and returns status, headers and body text.
/// Failures are transport failures only; non-2xx statuses are returned as
/// responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: &PreparedRequest) -> std::result::Result<RawResponse, TransportError>;
}

/// Production transport over `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Create a new transport with configuration
    pub fn new(config: TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .redirect(if config.max_redirects > 0 {
                reqwest::redirect::Policy::limited(config.max_redirects)
            } else {
                reqwest::redirect::Policy::none()
            });

        // Configure proxy if provided
        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| FetchError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| FetchError::BuildError(e.to_string()))?;

        Ok(Self { inner, config })
    }

    /// Create transport with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(TransportConfig::default())
    }

    /// Wrap an existing reqwest client
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self {
            inner,
            config: TransportConfig::default(),
        }
    }

    /// Get underlying reqwest client (for advanced usage)
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Get configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn call(&self, request: &PreparedRequest) -> std::result::Result<RawResponse, TransportError> {
        let url = request
            .url
            .parse::<url::Url>()
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", request.url)))?;

        debug!(
            "HTTP {}: {} (credentials: {})",
            request.method, url, request.credentials
        );

        let mut builder = self
            .inner
            .request(request.method.to_method(), url)
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

/// Create a shared transport (Arc-wrapped for cloning)
pub fn shared_transport(config: TransportConfig) -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(ReqwestTransport::new(config)?))
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderMap;

    use super::*;
    use crate::request::{Credentials, RequestMethod};

    fn request(url: &str) -> PreparedRequest {
        PreparedRequest {
            method: RequestMethod::Get,
            url: url.to_string(),
            headers: HeaderMap::new(),
            body: None,
            credentials: Credentials::SameOrigin,
        }
    }

    #[test]
    fn test_transport_creation_with_defaults() {
        let transport = ReqwestTransport::with_defaults();
        assert!(transport.is_ok());
    }

    #[test]
    fn test_transport_with_proxy() {
        let config = TransportConfig::default().with_proxy("http://proxy.example.com:8080");

        let transport = ReqwestTransport::new(config).unwrap();
        assert_eq!(
            transport.config().proxy.as_deref(),
            Some("http://proxy.example.com:8080")
        );
    }

    #[test]
    fn test_unparsable_proxy_is_rejected() {
        // unterminated IPv6 host
        let config = TransportConfig::default().with_proxy("http://[");

        let result = ReqwestTransport::new(config);
        assert!(matches!(result, Err(FetchError::InvalidProxy(_))));
    }

    #[test]
    fn test_bare_proxy_host_is_accepted() {
        let config = TransportConfig::default().with_proxy("corp-proxy");
        assert!(ReqwestTransport::new(config).is_ok());
    }

    #[tokio::test]
    async fn test_relative_url_is_rejected() {
        let transport = ReqwestTransport::with_defaults().unwrap();
        let result = transport.call(&request("/users")).await;
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_shared_transport_creation() {
        assert!(shared_transport(TransportConfig::default()).is_ok());
    }
}
