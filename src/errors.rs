// SPDX-License-Identifier: MPL-2.0

//! Error types for the frame flow crate
//!
//! The decision core itself never fails; these errors only occur at the edges
//! (configuration, transport setup, I/O).

use std::fmt;

/// Result type alias using FlowError
pub type FlowResult<T> = Result<T, FlowError>;

/// Main error type
#[derive(Debug, Clone)]
pub enum FlowError {
    /// Configuration errors
    Config(ConfigError),
    /// Transport setup or hand-off errors
    Transport(TransportError),
    /// Filesystem errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Config file could not be parsed
    Malformed(String),
    /// A field holds a value outside its domain
    InvalidValue {
        /// Dotted path of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
    /// No config directory on this system
    NoConfigDir,
}

/// Transport errors
#[derive(Debug, Clone)]
pub enum TransportError {
    /// The worker channel was closed while frames were still in flight
    WorkerDisconnected,
    /// The worker channel was full although admission allowed the frame
    ChannelFull,
    /// Runtime for asynchronous effects could not be created
    RuntimeUnavailable(String),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::Config(e) => write!(f, "Configuration error: {}", e),
            FlowError::Transport(e) => write!(f, "Transport error: {}", e),
            FlowError::Io(msg) => write!(f, "I/O error: {}", msg),
            FlowError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Malformed(msg) => write!(f, "Malformed config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for {}: {}", field, reason)
            }
            ConfigError::NoConfigDir => write!(f, "No configuration directory available"),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::WorkerDisconnected => write!(f, "Worker channel disconnected"),
            TransportError::ChannelFull => write!(f, "Worker channel full"),
            TransportError::RuntimeUnavailable(msg) => {
                write!(f, "Async runtime unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for FlowError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for TransportError {}

impl From<ConfigError> for FlowError {
    fn from(err: ConfigError) -> Self {
        FlowError::Config(err)
    }
}

impl From<TransportError> for FlowError {
    fn from(err: TransportError) -> Self {
        FlowError::Transport(err)
    }
}

impl From<String> for FlowError {
    fn from(msg: String) -> Self {
        FlowError::Other(msg)
    }
}

impl From<std::io::Error> for FlowError {
    fn from(err: std::io::Error) -> Self {
        FlowError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Config(ConfigError::Malformed(err.to_string()))
    }
}
