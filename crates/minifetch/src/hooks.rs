//! Before-request and after-response hooks
//!
//! Hooks run sequentially in registration order around every transport
//! call, including the retry after a refresh. An error from any hook aborts
//! the request with [`FetchError::Hook`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::{BoxError, FetchError, Result},
    request::PreparedRequest,
    response::RawResponse,
};

/// Inspects or mutates a request before it is sent
///
/// Plain closures `Fn(&mut PreparedRequest) -> Result<(), BoxError>` implement
/// this trait; implement it directly when the hook needs to await.
#[async_trait]
pub trait BeforeRequestHook: Send + Sync {
    async fn before_request(&self, request: &mut PreparedRequest) -> std::result::Result<(), BoxError>;
}

/// Inspects the raw response before the body is parsed
#[async_trait]
pub trait AfterResponseHook: Send + Sync {
    async fn after_response(
        &self,
        request: &PreparedRequest,
        response: &RawResponse,
    ) -> std::result::Result<(), BoxError>;
}

#[async_trait]
impl<F> BeforeRequestHook for F
where
    F: Fn(&mut PreparedRequest) -> std::result::Result<(), BoxError> + Send + Sync,
{
    async fn before_request(&self, request: &mut PreparedRequest) -> std::result::Result<(), BoxError> {
        (self)(request)
    }
}

#[async_trait]
impl<F> AfterResponseHook for F
where
    F: Fn(&PreparedRequest, &RawResponse) -> std::result::Result<(), BoxError> + Send + Sync,
{
    async fn after_response(
        &self,
        request: &PreparedRequest,
        response: &RawResponse,
    ) -> std::result::Result<(), BoxError> {
        (self)(request, response)
    }
}

/// Ordered hook lists owned by one client
#[derive(Default)]
pub struct HookRegistry {
    before: RwLock<Vec<Arc<dyn BeforeRequestHook>>>,
    after: RwLock<Vec<Arc<dyn AfterResponseHook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a before-request hook
    pub async fn register_before_request(&self, hook: Arc<dyn BeforeRequestHook>) {
        self.before.write().await.push(hook);
    }

    /// Append an after-response hook
    pub async fn register_after_response(&self, hook: Arc<dyn AfterResponseHook>) {
        self.after.write().await.push(hook);
    }

    /// Number of registered (before, after) hooks
    pub async fn counts(&self) -> (usize, usize) {
        (self.before.read().await.len(), self.after.read().await.len())
    }

    /// Run before-request hooks in order, stopping at the first error
    pub async fn run_before_request(&self, request: &mut PreparedRequest) -> Result<()> {
        // snapshot so hooks may register further hooks without deadlocking
        let hooks = self.before.read().await.clone();
        for hook in hooks {
            hook.before_request(request).await.map_err(FetchError::Hook)?;
        }
        Ok(())
    }

    /// Run after-response hooks in order, stopping at the first error
    pub async fn run_after_response(
        &self,
        request: &PreparedRequest,
        response: &RawResponse,
    ) -> Result<()> {
        let hooks = self.after.read().await.clone();
        for hook in hooks {
            hook.after_response(request, response)
                .await
                .map_err(FetchError::Hook)?;
        }
        Ok(())
    }
}
