//! Error types for the remote tier and configuration loading.
//!
//! Public cache operations never return these: remote failures are logged and
//! answered from the fallback store. They exist so the facade can classify a
//! failure and so configuration problems surface at startup.

use thiserror::Error;

/// How a remote failure affects the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// The remote refused the connection (nothing listening)
    TransportUnavailable,
    /// The connection was usable once and is now permanently closed
    TransportClosed,
    /// Any other failure of a single command
    Operation,
}

impl BackendErrorKind {
    /// Whether this failure latches the facade into local mode
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::TransportUnavailable | Self::TransportClosed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransportUnavailable => "transport_unavailable",
            Self::TransportClosed => "transport_closed",
            Self::Operation => "operation",
        }
    }
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call against the remote backend
#[derive(Debug, Clone, Error)]
#[error("{command} failed ({kind}): {message}")]
pub struct BackendError {
    kind: BackendErrorKind,
    command: &'static str,
    message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, command: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            command,
            message: message.into(),
        }
    }

    pub fn unavailable(command: &'static str, message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::TransportUnavailable, command, message)
    }

    pub fn closed(command: &'static str, message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::TransportClosed, command, message)
    }

    pub fn operation(command: &'static str, message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Operation, command, message)
    }

    /// Classify a client error raised while running `command`
    pub fn from_redis(command: &'static str, err: &redis::RedisError) -> Self {
        let kind = if err.is_connection_refusal() {
            BackendErrorKind::TransportUnavailable
        } else if err.is_connection_dropped() {
            BackendErrorKind::TransportClosed
        } else {
            BackendErrorKind::Operation
        };
        Self::new(kind, command, err.to_string())
    }

    pub fn kind(&self) -> BackendErrorKind {
        self.kind
    }

    pub fn command(&self) -> &'static str {
        self.command
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for remote backend calls
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Configuration sources could not be read or merged
    #[error("Configuration load error: {0}")]
    LoadError(String),

    /// Merged configuration did not match the expected shape
    #[error("Configuration deserialize error: {0}")]
    DeserializeError(String),

    /// A field holds a value the cache cannot run with
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigurationError {
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(err: config::ConfigError) -> Self {
        let message = err.to_string();
        match err {
            config::ConfigError::Type { .. } | config::ConfigError::Message(_) => {
                Self::DeserializeError(message)
            }
            _ => Self::LoadError(message),
        }
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigurationError>;
