//! Per-protocol connection strategies.
//!
//! A strategy owns the "how" of one tunnel family; the manager owns the
//! lifecycle. All strategies expose the same surface: establish, teardown,
//! a liveness check, and optional traffic counters for the stats poller.

mod engine;
mod ssh;
mod udp;

pub use engine::EngineStrategy;
pub use ssh::SshStrategy;
pub use udp::UdpStrategy;

use async_trait::async_trait;
use tk_types::{ServerRecord, TrafficSnapshot};

use crate::error::ConnectError;

#[async_trait]
pub trait ConnectStrategy: Send + Sync {
    /// Bring the tunnel up for `record`. Returns once the tunnel is usable.
    async fn establish(&self, record: &ServerRecord) -> Result<(), ConnectError>;

    /// Tear the tunnel down. Must be safe to call when already down.
    async fn teardown(&self) -> Result<(), ConnectError>;

    /// Whether the tunnel is still up. Polled by the stats loop.
    fn is_alive(&self) -> bool;

    /// Cumulative counters since establish, if this family reports any.
    fn traffic(&self) -> Option<TrafficSnapshot>;
}
