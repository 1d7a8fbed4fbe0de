//! Typed errors for the collaborator ports.
//!
//! Every port boundary maps its failures into one of these enums; the
//! connection manager translates them into lifecycle states plus a retained
//! human-readable message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server store failures.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum StoreError {
    #[error("record not found: {id}")]
    NotFound { id: String },

    #[error("storage backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Proxy engine failures (start/stop/stats of the external tunnel core).
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum EngineError {
    #[error("engine failed to start: {message}")]
    Start { message: String },

    #[error("engine failed to stop: {message}")]
    Stop { message: String },

    #[error("engine is not running")]
    NotRunning,
}

impl EngineError {
    pub fn start(message: impl Into<String>) -> Self {
        Self::Start {
            message: message.into(),
        }
    }

    pub fn stop(message: impl Into<String>) -> Self {
        Self::Stop {
            message: message.into(),
        }
    }
}

/// SSH tunnel collaborator failures.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum TunnelError {
    #[error("ssh auth failed: {message}")]
    Auth { message: String },

    #[error("ssh connect failed: {message}")]
    Connect { message: String },

    #[error("ssh tunnel error: {message}")]
    Other { message: String },
}

impl TunnelError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// UDP relay collaborator failures.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum RelayError {
    #[error("relay failed to start: {message}")]
    Start { message: String },

    #[error("relay failed to stop: {message}")]
    Stop { message: String },
}

impl RelayError {
    pub fn start(message: impl Into<String>) -> Self {
        Self::Start {
            message: message.into(),
        }
    }

    pub fn stop(message: impl Into<String>) -> Self {
        Self::Stop {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_serialize() {
        let e = EngineError::start("core exited with status 1");
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("core exited"));
        assert_eq!(e.to_string(), "engine failed to start: core exited with status 1");
    }
}
