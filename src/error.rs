use std::time::Duration;

use thiserror::Error;

use crate::types::ResourceKind;

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("IO error ({context}): {source}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("Read timed out after {0:?}")]
    Timeout(Duration),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Protocol violation: expected {expected}, got {actual:?}")]
    ProtocolViolation { expected: String, actual: String },
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("{kind} {name} not available")]
    ResourceUnavailable { kind: ResourceKind, name: String },
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ScopeError {
    /// Wrap an IO error with a short description of what was being done.
    pub fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        ScopeError::Io {
            source,
            context: context.into(),
        }
    }

    /// True for failures caused by an elapsed read timeout rather than a broken link.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScopeError::Timeout(_))
    }
}
