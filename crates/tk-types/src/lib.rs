//! Core data model and collaborator contracts for tunkit.
//!
//! This crate defines the canonical [`ServerRecord`] shared by the link
//! codecs, the config generator and the connection manager, the typed error
//! taxonomy used across crate boundaries, and the port traits behind which
//! the external collaborators (server store, proxy engine, SSH tunnel, UDP
//! relay) live.
//!
//! Typed errors allow pattern matching and policy-based handling; `anyhow`
//! is not allowed here or in any tk-* library crate.

pub mod country;
pub mod errors;
pub mod ports;
pub mod record;

pub use errors::{EngineError, RelayError, StoreError, TunnelError};
pub use ports::{MemoryStore, ProxyEngine, ServerStore, SshTunnel, TrafficSnapshot, TunnelEvent, UdpRelay};
pub use record::{Protocol, ServerRecord, TransportKind, UNKNOWN_COUNTRY};
