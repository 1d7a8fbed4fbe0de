//! Strategy for the engine-backed protocols (VMess, VLESS, Trojan,
//! Shadowsocks): generate the outbound document, hand it to the engine.

use std::sync::Arc;

use async_trait::async_trait;
use tk_config::GenerationOptions;
use tk_types::{ProxyEngine, ServerRecord, TrafficSnapshot};
use tracing::info;

use crate::error::ConnectError;
use crate::strategy::ConnectStrategy;

pub struct EngineStrategy {
    engine: Arc<dyn ProxyEngine>,
    options: GenerationOptions,
}

impl EngineStrategy {
    pub fn new(engine: Arc<dyn ProxyEngine>, options: GenerationOptions) -> Self {
        Self { engine, options }
    }
}

#[async_trait]
impl ConnectStrategy for EngineStrategy {
    async fn establish(&self, record: &ServerRecord) -> Result<(), ConnectError> {
        let config = tk_config::generate(record, &self.options);
        self.engine.start(config.to_json()).await?;
        info!(
            protocol = %record.protocol,
            server = %record.display_name(),
            "engine started"
        );
        Ok(())
    }

    async fn teardown(&self) -> Result<(), ConnectError> {
        self.engine.stop().await?;
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.engine.is_running()
    }

    fn traffic(&self) -> Option<TrafficSnapshot> {
        Some(self.engine.traffic())
    }
}
