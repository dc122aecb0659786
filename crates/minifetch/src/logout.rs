//! Logout notification fired when a refresh permanently fails

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The refresher reported a negative result
    RefreshFailed,
    /// The refresher itself returned an error
    RefreshException,
}

impl LogoutReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogoutReason::RefreshFailed => "refresh_failed",
            LogoutReason::RefreshException => "refresh_exception",
        }
    }
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fire-and-forget logout notification
pub trait LogoutSignal: Send + Sync {
    fn signal(&self, reason: LogoutReason);
}

impl<F> LogoutSignal for F
where
    F: Fn(LogoutReason) + Send + Sync,
{
    fn signal(&self, reason: LogoutReason) {
        self(reason)
    }
}

/// [`LogoutSignal`] that fans out to every subscriber over a broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastLogout {
    sender: broadcast::Sender<LogoutReason>,
}

impl BroadcastLogout {
    /// Create a bus buffering up to `capacity` unread reasons per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogoutReason> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastLogout {
    fn default() -> Self {
        Self::new(16)
    }
}

impl LogoutSignal for BroadcastLogout {
    fn signal(&self, reason: LogoutReason) {
        // no subscribers is not an error
        let _ = self.sender.send(reason);
    }
}
