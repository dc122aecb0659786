//! Fetch-style HTTP client with bearer tokens and refresh-on-401
//!
//! Lets application code issue authenticated JSON calls without handling
//! token attachment, 401 recovery, or error plumbing at every call site.
//!
//! ## Features
//!
//! - **Bearer tokens**: read from a [`TokenStore`] on every request
//! - **Refresh on 401**: one coordinated refresh, one replay of the request
//! - **Single-flight**: concurrent 401s share a single refresh call
//! - **Hooks**: before-request and after-response, run in registration order
//! - **Safe calls**: [`SafeResult`] values instead of propagated errors
//! - **Trait-based transport**: [`ReqwestTransport`] by default, mockable via [`Transport`]
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use minifetch::{
//!     safe_get, AuthClient, BoxError, BroadcastLogout, FetchConfig, InMemoryTokenStore,
//!     RefreshOutcome, RequestOptions,
//! };
//! use serde_json::Value;
//!
//! # async fn run() -> minifetch::Result<()> {
//! let tokens = Arc::new(InMemoryTokenStore::with_token("access-token"));
//! let logout = BroadcastLogout::default();
//! let mut logouts = logout.subscribe();
//!
//! let client = AuthClient::builder(FetchConfig::new("https://api.example.com"))
//!     .token_store(tokens.clone())
//!     .refresher(|| async { Ok::<_, BoxError>(RefreshOutcome::from("renewed-token")) })
//!     .logout_signal(Arc::new(logout))
//!     .build()?;
//!
//! let me: Value = client.get("/users/me", RequestOptions::new()).await?;
//!
//! let result = safe_get::<Value>(&client, "/users/me/friends", RequestOptions::new()).await;
//! if let Some(error) = result.error() {
//!     eprintln!("{error}");
//! }
//! # let _ = (me, logouts.try_recv());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod logout;
pub mod message;
pub mod refresh;
pub mod request;
pub mod response;
pub mod safe;
pub mod token;
pub mod transport;

pub use client::{AuthClient, AuthClientBuilder};
pub use config::{FetchConfig, TransportConfig};
pub use error::{BoxError, ClientError, FetchError, Result, TransportError, DEFAULT_ERROR_CODE};
pub use hooks::{AfterResponseHook, BeforeRequestHook, HookRegistry};
pub use logging::{scoped, LogLevel, Logger, TracingLogger};
pub use logout::{BroadcastLogout, LogoutReason, LogoutSignal};
pub use message::normalize_error_message;
pub use refresh::RefreshCoordinator;
pub use request::{
    Credentials, PreparedRequest, RequestBuilder, RequestMethod, RequestOptions, RequestSpec,
};
pub use response::{parse_body, RawResponse, ResponseEnvelope};
pub use safe::{safe_call, safe_delete, safe_get, safe_post, safe_put, SafeResult};
pub use token::{InMemoryTokenStore, RefreshOutcome, TokenRefresher, TokenStore};
pub use transport::{shared_transport, ReqwestTransport, Transport};

/// Re-export commonly used types
pub use reqwest::{header, StatusCode};
