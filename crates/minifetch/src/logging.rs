//! Leveled logging seam
//!
//! The client logs through the [`Logger`] trait so applications can route
//! messages wherever they like. [`TracingLogger`] is the default and forwards
//! everything to `tracing` under the `minifetch` target.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Log severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    /// Suppresses all output when used as a minimum level
    Silent,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Silent => "silent",
        };
        f.write_str(name)
    }
}

/// Leveled logger used by the client and the safe-call adapter
pub trait Logger: Send + Sync {
    /// Emit a message at the given level
    fn log(&self, level: LogLevel, message: &str);

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Scoped sub-logger, for loggers that support prefixes.
    ///
    /// Returns `None` when the logger has no notion of scope.
    fn with_prefix(&self, _prefix: &str) -> Option<Arc<dyn Logger>> {
        None
    }
}

/// Resolve a scoped logger once, falling back to `logger` itself.
pub fn scoped(logger: &Arc<dyn Logger>, prefix: &str) -> Arc<dyn Logger> {
    logger
        .with_prefix(prefix)
        .unwrap_or_else(|| Arc::clone(logger))
}

/// [`Logger`] backed by `tracing`
///
/// The scope prefix is attached as a structured `scope` field.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    scope: Option<String>,
    min_level: LogLevel,
}

impl TracingLogger {
    /// Create a logger that forwards every level to `tracing`
    pub fn new() -> Self {
        Self {
            scope: None,
            min_level: LogLevel::Debug,
        }
    }

    /// Drop messages below `level`
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Change the minimum level
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Silent && level >= self.min_level
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let scope = self.scope.as_deref().unwrap_or_default();
        match level {
            LogLevel::Debug => debug!(target: "minifetch", scope, "{message}"),
            LogLevel::Info => info!(target: "minifetch", scope, "{message}"),
            LogLevel::Warn => warn!(target: "minifetch", scope, "{message}"),
            LogLevel::Error => error!(target: "minifetch", scope, "{message}"),
            LogLevel::Silent => {}
        }
    }

    fn with_prefix(&self, prefix: &str) -> Option<Arc<dyn Logger>> {
        let scope = match &self.scope {
            Some(outer) => format!("{outer}{prefix}"),
            None => prefix.to_string(),
        };
        Some(Arc::new(Self {
            scope: Some(scope),
            min_level: self.min_level,
        }))
    }
}
