//! Authenticated client
//!
//! Executes one logical request end to end: build, hooks, transport, parse,
//! and on a 401 a single coordinated refresh followed by one replay of the
//! same endpoint.

use std::{fmt, sync::Arc};

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::FetchConfig,
    error::{ClientError, FetchError, Result},
    hooks::{AfterResponseHook, BeforeRequestHook, HookRegistry},
    logging::{scoped, Logger, TracingLogger},
    logout::LogoutSignal,
    refresh::RefreshCoordinator,
    request::{RequestBuilder, RequestMethod, RequestOptions, RequestSpec},
    response::ResponseEnvelope,
    token::{TokenRefresher, TokenStore},
    transport::{ReqwestTransport, Transport},
};

/// Fetch-style client with bearer tokens and refresh-on-401
///
/// Cheap to share behind an `Arc`; many requests may be in flight at once
/// and they all share one refresh coordinator.
pub struct AuthClient {
    config: FetchConfig,
    builder: RequestBuilder,
    transport: Arc<dyn Transport>,
    refresh: Option<RefreshCoordinator>,
    hooks: HookRegistry,
    root_logger: Arc<dyn Logger>,
    logger: Arc<dyn Logger>,
}

impl AuthClient {
    /// Start configuring a client
    pub fn builder(config: FetchConfig) -> AuthClientBuilder {
        AuthClientBuilder::new(config)
    }

    /// Client without token handling, using the default transport and logger
    pub fn new(config: FetchConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Get configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// The logger supplied at construction, before scoping
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.root_logger
    }

    /// Whether a token refresh is currently pending
    pub fn is_refreshing(&self) -> bool {
        self.refresh
            .as_ref()
            .is_some_and(RefreshCoordinator::is_refreshing)
    }

    /// Register a hook run before every transport call, in registration order
    pub async fn register_before_request(&self, hook: impl BeforeRequestHook + 'static) {
        self.hooks.register_before_request(Arc::new(hook)).await;
    }

    /// Register a hook run after every transport call, in registration order
    pub async fn register_after_response(&self, hook: impl AfterResponseHook + 'static) {
        self.hooks.register_after_response(Arc::new(hook)).await;
    }

    /// GET `endpoint`
    pub async fn get<T>(&self, endpoint: &str, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.execute(RequestSpec::new(RequestMethod::Get, endpoint).with_options(options))
            .await
    }

    /// POST `body` as JSON to `endpoint`; bodies serializing to `null` are omitted
    pub async fn post<T, B>(&self, endpoint: &str, body: &B, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(
            RequestSpec::new(RequestMethod::Post, endpoint)
                .with_body(body)?
                .with_options(options),
        )
        .await
    }

    /// PUT `body` as JSON to `endpoint`
    pub async fn put<T, B>(&self, endpoint: &str, body: &B, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(
            RequestSpec::new(RequestMethod::Put, endpoint)
                .with_body(body)?
                .with_options(options),
        )
        .await
    }

    /// DELETE `endpoint`, with an optional JSON body
    pub async fn delete<T, B>(&self, endpoint: &str, body: &B, options: RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(
            RequestSpec::new(RequestMethod::Delete, endpoint)
                .with_body(body)?
                .with_options(options),
        )
        .await
    }

    /// Execute a request and decode its JSON body into `T`.
    ///
    /// Empty and non-JSON bodies decode from `null`, so `Value` or `Option<_>`
    /// targets never fail on them.
    pub async fn execute<T>(&self, spec: RequestSpec) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let data = self.send(&spec).await?;
        serde_json::from_value(data).map_err(FetchError::Decode)
    }

    /// Execute a request and return the parsed body as JSON
    pub async fn send(&self, spec: &RequestSpec) -> Result<Value> {
        let url = self.config.resolve_url(&spec.endpoint);
        let response = self.dispatch(spec, &url).await?;
        if response.is_success() {
            return Ok(response.data);
        }

        if response.status == StatusCode::UNAUTHORIZED {
            if let Some(refresh) = self.refresh_for(&spec.endpoint) {
                self.logger.warn("401 received, attempting refresh...");
                if refresh.refresh().await {
                    // the retry is final whatever it returns
                    let retry = self.dispatch(spec, &url).await?;
                    if retry.is_success() {
                        return Ok(retry.data);
                    }
                    return Err(self.fail(&spec.endpoint, retry));
                }
            }
        }

        Err(self.fail(&spec.endpoint, response))
    }

    fn refresh_for(&self, endpoint: &str) -> Option<&RefreshCoordinator> {
        self.refresh
            .as_ref()
            .filter(|_| !self.config.is_refresh_exempt(endpoint))
    }

    /// One transport round trip; the request is rebuilt each time so a
    /// refreshed token is picked up.
    async fn dispatch(&self, spec: &RequestSpec, url: &str) -> Result<ResponseEnvelope> {
        let mut request = self.builder.build(spec, url)?;
        self.hooks.run_before_request(&mut request).await?;

        self.logger
            .info(&format!("→ {} {}", request.method, request.url));
        let raw = self.transport.call(&request).await?;
        self.hooks.run_after_response(&request, &raw).await?;
        self.logger
            .info(&format!("← {} {}", raw.status.as_u16(), spec.endpoint));

        Ok(ResponseEnvelope::from(raw))
    }

    fn fail(&self, endpoint: &str, response: ResponseEnvelope) -> FetchError {
        let error = ClientError::from_response(response.status, &response.status_text, response.data);
        self.logger.error(&format!(
            "{endpoint} failed with {} ({}): {}",
            error.status.as_u16(),
            error.code,
            error.message
        ));
        FetchError::Http(error)
    }
}

impl fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthClient")
            .field("config", &self.config)
            .field("builder", &self.builder)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

/// Builder attaching collaborators to an [`AuthClient`]
#[must_use]
pub struct AuthClientBuilder {
    config: FetchConfig,
    tokens: Option<Arc<dyn TokenStore>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    logout: Option<Arc<dyn LogoutSignal>>,
    logger: Option<Arc<dyn Logger>>,
    transport: Option<Arc<dyn Transport>>,
}

impl AuthClientBuilder {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            tokens: None,
            refresher: None,
            logout: None,
            logger: None,
            transport: None,
        }
    }

    /// Token source and update callback
    pub fn token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Refresh callback; without one a 401 fails immediately
    pub fn refresher(mut self, refresher: impl TokenRefresher + 'static) -> Self {
        self.refresher = Some(Arc::new(refresher));
        self
    }

    /// Notified when a refresh permanently fails
    pub fn logout_signal(mut self, logout: Arc<dyn LogoutSignal>) -> Self {
        self.logout = Some(logout);
        self
    }

    /// Logger; defaults to [`TracingLogger`]
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Transport; defaults to a [`ReqwestTransport`] built from the config
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<AuthClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.config.transport.clone())?),
        };
        let root_logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger::new()));
        let logger = scoped(&root_logger, "[Fetch]");

        let builder = RequestBuilder::new(
            self.tokens.clone(),
            self.config.credentials,
            Arc::clone(&logger),
        );
        let refresh = self.refresher.map(|refresher| {
            RefreshCoordinator::new(refresher, self.tokens, self.logout, Arc::clone(&logger))
        });

        Ok(AuthClient {
            config: self.config,
            builder,
            transport,
            refresh,
            hooks: HookRegistry::new(),
            root_logger,
            logger,
        })
    }
}
