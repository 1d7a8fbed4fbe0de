//! Connection failures as seen by manager callers.

use thiserror::Error;
use tk_types::{EngineError, RelayError, TunnelError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("record failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("engine: {0}")]
    Engine(String),

    #[error("ssh: {0}")]
    Ssh(String),

    #[error("relay: {0}")]
    Relay(String),

    #[error("operation timed out")]
    Timeout,

    #[error("operation cancelled")]
    Cancelled,
}

impl From<EngineError> for ConnectError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e.to_string())
    }
}

impl From<TunnelError> for ConnectError {
    fn from(e: TunnelError) -> Self {
        Self::Ssh(e.to_string())
    }
}

impl From<RelayError> for ConnectError {
    fn from(e: RelayError) -> Self {
        Self::Relay(e.to_string())
    }
}
