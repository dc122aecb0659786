//! Single-flight token refresh
//!
//! When several requests hit a 401 at the same time only one refresh call is
//! made. The first caller installs a shared future in the slot; everyone who
//! arrives while it is pending awaits that same future and receives the same
//! outcome. The future empties the slot itself before yielding its outcome,
//! so the slot is cleared even if the caller that started it is dropped.
//!
//! The pending future only holds a weak handle to the slot, so an abandoned
//! refresh is dropped together with the last coordinator handle.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::{
    logging::Logger,
    logout::{LogoutReason, LogoutSignal},
    token::{RefreshOutcome, TokenRefresher, TokenStore},
};

type PendingRefresh = Shared<BoxFuture<'static, bool>>;
type RefreshSlot = Mutex<Option<PendingRefresh>>;

/// Coordinates refresh attempts for one client
#[derive(Clone)]
pub struct RefreshCoordinator {
    session: Arc<Session>,
    in_flight: Arc<RefreshSlot>,
}

/// Collaborators used by a refresh attempt
struct Session {
    refresher: Arc<dyn TokenRefresher>,
    tokens: Option<Arc<dyn TokenStore>>,
    logout: Option<Arc<dyn LogoutSignal>>,
    logger: Arc<dyn Logger>,
}

impl RefreshCoordinator {
    pub fn new(
        refresher: Arc<dyn TokenRefresher>,
        tokens: Option<Arc<dyn TokenStore>>,
        logout: Option<Arc<dyn LogoutSignal>>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            session: Arc::new(Session {
                refresher,
                tokens,
                logout,
                logger,
            }),
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a refresh call is currently pending
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Refresh the session, joining the pending attempt if there is one.
    ///
    /// Returns `true` when the refresher succeeded.
    pub async fn refresh(&self) -> bool {
        let pending = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(pending) => {
                    self.session
                        .logger
                        .debug("Refresh already in flight, waiting for it");
                    pending.clone()
                }
                None => {
                    let pending = run(Arc::clone(&self.session), Arc::downgrade(&self.in_flight))
                        .boxed()
                        .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }
}

async fn run(session: Arc<Session>, slot: Weak<RefreshSlot>) -> bool {
    let refreshed = session.attempt().await;
    if let Some(slot) = slot.upgrade() {
        slot.lock().take();
    }
    refreshed
}

impl Session {
    async fn attempt(&self) -> bool {
        match self.refresher.refresh().await {
            Ok(outcome) if outcome.is_success() => {
                // a bare `true` means the refresher already updated the store
                if let RefreshOutcome::Token(token) = outcome {
                    if let Some(tokens) = &self.tokens {
                        tokens.set_token(Some(token));
                    }
                }
                self.logger.info("Token refreshed");
                true
            }
            Ok(_) => {
                self.logger.warn("Refresh returned a negative result");
                self.end_session(LogoutReason::RefreshFailed);
                false
            }
            Err(err) => {
                self.logger.error(&format!("Refresh exception: {err}"));
                self.end_session(LogoutReason::RefreshException);
                false
            }
        }
    }

    fn end_session(&self, reason: LogoutReason) {
        if let Some(tokens) = &self.tokens {
            tokens.set_token(None);
        }
        if let Some(logout) = &self.logout {
            logout.signal(reason);
        }
    }
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .finish()
    }
}
