//! Placeholder SSH/UDP collaborators for the CLI build.
//!
//! The CLI ships with the process engine only; SSH tunnels and UDP relays
//! are provided by embedders of the library crates. These stubs fail the
//! connect cleanly instead of pretending.

use async_trait::async_trait;
use tk_types::{RelayError, ServerRecord, SshTunnel, TunnelError, TunnelEvent, UdpRelay};
use tokio::sync::mpsc;

pub struct UnavailableSsh;

#[async_trait]
impl SshTunnel for UnavailableSsh {
    async fn connect(
        &self,
        _record: &ServerRecord,
        _events: mpsc::Sender<TunnelEvent>,
    ) -> Result<(), TunnelError> {
        Err(TunnelError::other("no ssh client configured in this build"))
    }

    async fn disconnect(&self) -> Result<(), TunnelError> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        false
    }
}

pub struct UnavailableUdp;

#[async_trait]
impl UdpRelay for UnavailableUdp {
    async fn start(&self, _address: &str, _port: u16, _obfs: Option<&str>) -> Result<(), RelayError> {
        Err(RelayError::start("no udp relay configured in this build"))
    }

    async fn stop(&self) -> Result<(), RelayError> {
        Ok(())
    }

    fn is_running(&self) -> bool {
        false
    }
}
