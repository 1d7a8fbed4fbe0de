//! Live session bookkeeping, owned exclusively by the manager loop.

use std::time::{SystemTime, UNIX_EPOCH};

use tk_types::ServerRecord;

/// Snapshot of the single live connection: the record being dialed, when it
/// came up, and cumulative traffic counters.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSession {
    pub record: ServerRecord,
    pub connected_at: i64,
    pub uplink_bytes: u64,
    pub downlink_bytes: u64,
}

impl ConnectionSession {
    pub fn new(record: ServerRecord) -> Self {
        let connected_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self {
            record,
            connected_at,
            uplink_bytes: 0,
            downlink_bytes: 0,
        }
    }

    pub fn update_traffic(&mut self, uplink_bytes: u64, downlink_bytes: u64) {
        self.uplink_bytes = uplink_bytes;
        self.downlink_bytes = downlink_bytes;
    }
}
