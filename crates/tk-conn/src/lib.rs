//! Connection lifecycle and probing.
//!
//! The manager sequences validate -> generate -> establish for one live
//! session at a time, with reconnect backoff and traffic polling; the probe
//! measures per-server latency with protocol-aware dialing.

pub mod error;
pub mod manager;
pub mod probe;
pub mod session;
pub mod state;
pub mod strategy;

pub use error::ConnectError;
pub use manager::{ConnectionManager, ManagerConfig, ManagerHandle};
pub use probe::{measure, measure_batch, LatencyResult, LatencyStatus};
pub use session::ConnectionSession;
pub use state::ConnectionState;
