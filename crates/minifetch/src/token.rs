//! Token storage and refresh callbacks supplied by the application

use std::future::Future;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::BoxError;

/// Source and sink of the bearer token
///
/// `token` is consulted every time a request is built, so a refresh that
/// updates the store is picked up by the retry.
pub trait TokenStore: Send + Sync {
    /// Current token, if any
    fn token(&self) -> Option<String>;

    /// Replace the token; `None` clears it
    fn set_token(&self, token: Option<String>);
}

/// Thread-safe in-memory [`TokenStore`]
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for InMemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}

/// What a refresh call produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new token; handed to [`TokenStore::set_token`] when non-empty
    Token(String),
    /// Success flag; on `true` the refresher is assumed to have updated the store itself
    Flag(bool),
}

impl RefreshOutcome {
    /// Non-empty token or `true`
    pub fn is_success(&self) -> bool {
        match self {
            RefreshOutcome::Token(token) => !token.is_empty(),
            RefreshOutcome::Flag(ok) => *ok,
        }
    }
}

impl From<bool> for RefreshOutcome {
    fn from(ok: bool) -> Self {
        RefreshOutcome::Flag(ok)
    }
}

impl From<String> for RefreshOutcome {
    fn from(token: String) -> Self {
        RefreshOutcome::Token(token)
    }
}

impl From<&str> for RefreshOutcome {
    fn from(token: &str) -> Self {
        RefreshOutcome::Token(token.to_string())
    }
}

impl From<Option<String>> for RefreshOutcome {
    fn from(token: Option<String>) -> Self {
        token.map_or(RefreshOutcome::Flag(false), RefreshOutcome::Token)
    }
}

/// Renews the session after a 401
///
/// An `Err` is treated as a refresh exception: the token is cleared and a
/// [`LogoutReason::RefreshException`](crate::LogoutReason::RefreshException)
/// is signalled.
///
/// Implemented for closures returning a future:
///
/// ```
/// use minifetch::{BoxError, RefreshOutcome, TokenRefresher};
///
/// fn assert_refresher(_: impl TokenRefresher) {}
///
/// assert_refresher(|| async { Ok::<_, BoxError>(RefreshOutcome::from("new-token")) });
/// ```
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> Result<RefreshOutcome, BoxError>;
}

#[async_trait]
impl<F, Fut> TokenRefresher for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<RefreshOutcome, BoxError>> + Send + 'static,
{
    async fn refresh(&self) -> Result<RefreshOutcome, BoxError> {
        (self)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_interpretation() {
        assert!(RefreshOutcome::from("abc").is_success());
        assert!(RefreshOutcome::from(true).is_success());
        assert!(!RefreshOutcome::from("").is_success());
        assert!(!RefreshOutcome::from(false).is_success());
        assert!(!RefreshOutcome::from(None).is_success());
        assert_eq!(
            RefreshOutcome::from(Some("t".to_string())),
            RefreshOutcome::Token("t".to_string())
        );
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryTokenStore::new();
        assert_eq!(store.token(), None);

        store.set_token(Some("abc".to_string()));
        assert_eq!(store.token().as_deref(), Some("abc"));

        store.set_token(None);
        assert_eq!(store.token(), None);

        assert_eq!(InMemoryTokenStore::with_token("x").token().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_closure_refresher() {
        let refresher = || async { Ok::<_, BoxError>(RefreshOutcome::Flag(true)) };
        assert_eq!(refresher.refresh().await.unwrap(), RefreshOutcome::Flag(true));

        let failing = || async { Err::<RefreshOutcome, BoxError>("expired".into()) };
        assert_eq!(failing.refresh().await.unwrap_err().to_string(), "expired");
    }
}
