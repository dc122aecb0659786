//! Client configuration

use serde::{Deserialize, Serialize};

use crate::request::Credentials;

/// Authenticated client configuration
///
/// Holds the plain-data settings; collaborators (token store, refresher,
/// logger, logout signal, transport) are attached through
/// [`AuthClient::builder`](crate::AuthClient::builder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Prefix for relative endpoints
    #[serde(default)]
    pub base_url: String,

    /// Client-wide credentials mode; `same-origin` when unset
    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Endpoint path prefixes for which a 401 never triggers a refresh
    #[serde(default = "default_refresh_exempt")]
    pub refresh_exempt: Vec<String>,

    /// Settings for the default reqwest transport
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            credentials: None,
            refresh_exempt: default_refresh_exempt(),
            transport: TransportConfig::default(),
        }
    }
}

impl FetchConfig {
    /// Create a config for `base_url` with defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the client-wide credentials mode
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Add an endpoint path prefix that must not trigger a refresh
    pub fn with_refresh_exempt(mut self, endpoint: impl Into<String>) -> Self {
        self.refresh_exempt.push(endpoint.into());
        self
    }

    /// Set transport settings
    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Absolute `http(s)` URLs are used verbatim, anything else is appended to the base URL
    pub fn resolve_url(&self, endpoint: &str) -> String {
        if is_absolute(endpoint) {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url, endpoint)
        }
    }

    /// Whether a 401 from `endpoint` must fail without attempting a refresh
    ///
    /// Absolute URLs under the base URL are matched on the part after it.
    pub fn is_refresh_exempt(&self, endpoint: &str) -> bool {
        let relative = match endpoint.strip_prefix(self.base_url.as_str()) {
            Some(rest) if !self.base_url.is_empty() && is_absolute(endpoint) => rest,
            _ => endpoint,
        };
        let path = match url::Url::parse(relative) {
            Ok(url) if is_http(&url) => url.path().to_string(),
            _ => relative.split(['?', '#']).next().unwrap_or_default().to_string(),
        };
        self.refresh_exempt
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Settings for [`ReqwestTransport`](crate::ReqwestTransport)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP/HTTPS proxy URL
    #[serde(default)]
    pub proxy: Option<String>,

    /// Maximum redirects to follow (0 = no redirects)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            proxy: None,
            max_redirects: default_max_redirects(),
        }
    }
}

impl TransportConfig {
    /// Set proxy URL
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set redirect limit
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}

fn is_http(url: &url::Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn is_absolute(endpoint: &str) -> bool {
    url::Url::parse(endpoint).is_ok_and(|url| is_http(&url))
}

// Default value functions for serde
fn default_refresh_exempt() -> Vec<String> {
    vec!["/auth/".to_string()]
}

fn default_user_agent() -> String {
    format!("minifetch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_redirects() -> usize {
    10
}
