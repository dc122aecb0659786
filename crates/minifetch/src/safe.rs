//! Safe-call adapter
//!
//! Wraps client calls so a failure comes back as a [`SafeResult`] value
//! instead of an `Err` that has to be propagated.

use std::{fmt, future::Future};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    client::AuthClient,
    error::{FetchError, Result},
    logging::{scoped, Logger},
    request::RequestOptions,
};

/// Outcome of a safe call: exactly one of `data` or `error` is present
pub struct SafeResult<T> {
    outcome: Result<T>,
}

impl<T> SafeResult<T> {
    pub fn ok(data: T) -> Self {
        Self { outcome: Ok(data) }
    }

    pub fn err(error: FetchError) -> Self {
        Self {
            outcome: Err(error),
        }
    }

    /// The response body, on success
    pub fn data(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    /// The error produced by the client, on failure
    pub fn error(&self) -> Option<&FetchError> {
        self.outcome.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Split into `(data, error)`
    pub fn into_parts(self) -> (Option<T>, Option<FetchError>) {
        match self.outcome {
            Ok(data) => (Some(data), None),
            Err(error) => (None, Some(error)),
        }
    }

    pub fn into_result(self) -> Result<T> {
        self.outcome
    }
}

impl<T> From<Result<T>> for SafeResult<T> {
    fn from(outcome: Result<T>) -> Self {
        Self { outcome }
    }
}

impl<T: fmt::Debug> fmt::Debug for SafeResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeResult")
            .field("data", &self.data())
            .field("error", &self.error())
            .finish()
    }
}

/// Run `action` and capture its outcome as a [`SafeResult`]
pub async fn safe_call<T, F, Fut>(logger: &dyn Logger, action: F) -> SafeResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match action().await {
        Ok(data) => {
            logger.debug("Safe request succeeded.");
            SafeResult::ok(data)
        }
        Err(error) => {
            logger.error(&format!(
                "Safe request failed: {}: {}",
                failure_label(&error),
                failure_message(&error)
            ));
            SafeResult::err(error)
        }
    }
}

fn failure_label(error: &FetchError) -> String {
    error
        .code()
        .map(str::to_string)
        .or_else(|| error.status().map(|s| s.as_u16().to_string()))
        .unwrap_or_else(|| "Error".to_string())
}

fn failure_message(error: &FetchError) -> String {
    match error.as_client_error() {
        Some(client_error) => client_error.message.clone(),
        None => error.to_string(),
    }
}

/// Safe GET
pub async fn safe_get<T>(client: &AuthClient, url: &str, options: RequestOptions) -> SafeResult<T>
where
    T: DeserializeOwned,
{
    let logger = scoped(client.logger(), "[SafeGet]");
    safe_call(logger.as_ref(), || client.get(url, options)).await
}

/// Safe POST
pub async fn safe_post<T, B>(
    client: &AuthClient,
    url: &str,
    body: &B,
    options: RequestOptions,
) -> SafeResult<T>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
{
    let logger = scoped(client.logger(), "[SafePost]");
    safe_call(logger.as_ref(), || client.post(url, body, options)).await
}

/// Safe PUT
pub async fn safe_put<T, B>(
    client: &AuthClient,
    url: &str,
    body: &B,
    options: RequestOptions,
) -> SafeResult<T>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
{
    let logger = scoped(client.logger(), "[SafePut]");
    safe_call(logger.as_ref(), || client.put(url, body, options)).await
}

/// Safe DELETE
pub async fn safe_delete<T, B>(
    client: &AuthClient,
    url: &str,
    body: &B,
    options: RequestOptions,
) -> SafeResult<T>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
{
    let logger = scoped(client.logger(), "[SafeDelete]");
    safe_call(logger.as_ref(), || client.delete(url, body, options)).await
}
