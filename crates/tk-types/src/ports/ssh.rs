//! SSH tunnel port.

use crate::errors::TunnelError;
use crate::record::ServerRecord;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Events emitted by the SSH tunnel collaborator over the channel handed to
/// [`SshTunnel::connect`]. This replaces the callback-listener set
/// (`onConnecting`/`onConnected`/...) with message passing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelEvent {
    Connecting,
    Connected,
    Disconnected,
    Error(String),
    Traffic { uplink_bytes: u64, downlink_bytes: u64 },
}

/// External SSH tunnel client.
#[async_trait]
pub trait SshTunnel: Send + Sync {
    /// Establish the tunnel for `record`. Lifecycle events, including any
    /// later unexpected drop, arrive on `events` until `disconnect`.
    async fn connect(
        &self,
        record: &ServerRecord,
        events: mpsc::Sender<TunnelEvent>,
    ) -> Result<(), TunnelError>;

    async fn disconnect(&self) -> Result<(), TunnelError>;

    fn is_connected(&self) -> bool;
}
