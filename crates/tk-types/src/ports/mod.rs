//! Port traits for the external collaborators.
//!
//! The core never talks to storage, the proxy engine, the SSH client or the
//! UDP relay directly; it goes through these traits so deployments can
//! inject real implementations and tests can inject fakes.

mod engine;
mod ssh;
mod store;
mod udp;

pub use engine::{ProxyEngine, TrafficSnapshot};
pub use ssh::{SshTunnel, TunnelEvent};
pub use store::{MemoryStore, ServerStore};
pub use udp::UdpRelay;
