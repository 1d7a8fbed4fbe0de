//! SSH tunnel strategy. The tunnel collaborator reports lifecycle and
//! traffic over an event channel; a pump task folds those into counters the
//! shared stats poller can read.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tk_types::{ServerRecord, SshTunnel, TrafficSnapshot, TunnelEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::ConnectError;
use crate::strategy::ConnectStrategy;

const EVENT_BUFFER: usize = 32;

#[derive(Default)]
struct TunnelGauges {
    alive: AtomicBool,
    uplink: AtomicU64,
    downlink: AtomicU64,
}

pub struct SshStrategy {
    tunnel: Arc<dyn SshTunnel>,
    gauges: Arc<TunnelGauges>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl SshStrategy {
    pub fn new(tunnel: Arc<dyn SshTunnel>) -> Self {
        Self {
            tunnel,
            gauges: Arc::new(TunnelGauges::default()),
            pump: Mutex::new(None),
        }
    }

    fn stop_pump(&self) {
        if let Ok(mut guard) = self.pump.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl ConnectStrategy for SshStrategy {
    async fn establish(&self, record: &ServerRecord) -> Result<(), ConnectError> {
        self.stop_pump();
        self.gauges.uplink.store(0, Ordering::Relaxed);
        self.gauges.downlink.store(0, Ordering::Relaxed);

        let (tx, mut rx) = mpsc::channel::<TunnelEvent>(EVENT_BUFFER);
        self.tunnel.connect(record, tx).await?;
        self.gauges.alive.store(true, Ordering::Relaxed);
        info!(server = %record.display_name(), "ssh tunnel established");

        let gauges = Arc::clone(&self.gauges);
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    TunnelEvent::Traffic {
                        uplink_bytes,
                        downlink_bytes,
                    } => {
                        gauges.uplink.store(uplink_bytes, Ordering::Relaxed);
                        gauges.downlink.store(downlink_bytes, Ordering::Relaxed);
                    }
                    TunnelEvent::Disconnected => {
                        gauges.alive.store(false, Ordering::Relaxed);
                        break;
                    }
                    TunnelEvent::Error(msg) => {
                        warn!(error = %msg, "ssh tunnel error");
                        gauges.alive.store(false, Ordering::Relaxed);
                        break;
                    }
                    TunnelEvent::Connecting | TunnelEvent::Connected => {}
                }
            }
            // Sender gone means the tunnel object was dropped.
            gauges.alive.store(false, Ordering::Relaxed);
        });
        if let Ok(mut guard) = self.pump.lock() {
            *guard = Some(handle);
        }
        Ok(())
    }

    async fn teardown(&self) -> Result<(), ConnectError> {
        self.stop_pump();
        self.gauges.alive.store(false, Ordering::Relaxed);
        self.tunnel.disconnect().await?;
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.gauges.alive.load(Ordering::Relaxed) && self.tunnel.is_connected()
    }

    fn traffic(&self) -> Option<TrafficSnapshot> {
        Some(TrafficSnapshot {
            uplink_bytes: self.gauges.uplink.load(Ordering::Relaxed),
            downlink_bytes: self.gauges.downlink.load(Ordering::Relaxed),
        })
    }
}
