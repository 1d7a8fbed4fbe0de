//! Plain UDP relay strategy. The relay collaborator does the work; the
//! record's password doubles as the optional obfuscation key.

use std::sync::Arc;

use async_trait::async_trait;
use tk_types::{ServerRecord, TrafficSnapshot, UdpRelay};
use tracing::info;

use crate::error::ConnectError;
use crate::strategy::ConnectStrategy;

pub struct UdpStrategy {
    relay: Arc<dyn UdpRelay>,
}

impl UdpStrategy {
    pub fn new(relay: Arc<dyn UdpRelay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl ConnectStrategy for UdpStrategy {
    async fn establish(&self, record: &ServerRecord) -> Result<(), ConnectError> {
        self.relay
            .start(&record.address, record.port, record.password.as_deref())
            .await?;
        info!(server = %record.display_name(), "udp relay started");
        Ok(())
    }

    async fn teardown(&self) -> Result<(), ConnectError> {
        self.relay.stop().await?;
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.relay.is_running()
    }

    fn traffic(&self) -> Option<TrafficSnapshot> {
        None
    }
}
