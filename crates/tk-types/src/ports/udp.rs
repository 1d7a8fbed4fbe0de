//! UDP relay port.

use crate::errors::RelayError;
use async_trait::async_trait;

/// External plain-UDP relay collaborator.
#[async_trait]
pub trait UdpRelay: Send + Sync {
    /// Start relaying to `address:port`, with an optional obfuscation key.
    async fn start(&self, address: &str, port: u16, obfs: Option<&str>) -> Result<(), RelayError>;
    async fn stop(&self) -> Result<(), RelayError>;
    fn is_running(&self) -> bool;
}
