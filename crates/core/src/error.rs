//! Configuration error model.

use thiserror::Error;

/// Result type used while resolving configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration resolution failure.
///
/// These are startup errors: the process is expected to log them and exit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable that has no usable default was not set.
    #[error("missing required variable {0}")]
    Missing(&'static str),

    /// A variable was set but could not be interpreted.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            message: message.into(),
        }
    }
}
