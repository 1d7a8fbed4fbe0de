//! Proxy engine port.

use crate::errors::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Cumulative traffic counters reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    pub uplink_bytes: u64,
    pub downlink_bytes: u64,
}

/// The external tunnel core (V2Ray/Xray-family engine).
///
/// `start` receives the generated outbound configuration document as JSON;
/// the document schema is the engine's own de-facto config format, produced
/// by `tk-config`.
#[async_trait]
pub trait ProxyEngine: Send + Sync {
    async fn start(&self, config: serde_json::Value) -> Result<(), EngineError>;
    async fn stop(&self) -> Result<(), EngineError>;
    fn is_running(&self) -> bool;
    /// Cumulative counters since `start`. Implementations reset on start.
    fn traffic(&self) -> TrafficSnapshot;
}
