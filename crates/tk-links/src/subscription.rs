//! Subscription payload import.
//!
//! A subscription body is either a base64 blob wrapping a line list or the
//! plain line list itself. Each line is one share-link; blank lines and
//! comment lines are skipped. A bad line is recorded in the report and never
//! aborts the batch.

use tk_types::ServerRecord;
use tracing::debug;

use crate::{base64x, parse_uri, LinkError};

/// Outcome of one import pass: everything that parsed plus, per failed line,
/// its 1-based line number and the error.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub records: Vec<ServerRecord>,
    pub failures: Vec<(usize, LinkError)>,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.failures.is_empty()
    }
}

/// Import a subscription body. The base64 layer is optional; if the whole
/// payload decodes to UTF-8 it is treated as the line list, otherwise the
/// raw text is.
pub fn import(payload: &str) -> ImportReport {
    let text = match base64x::decode_string(payload) {
        Ok(decoded) => decoded,
        Err(_) => payload.to_string(),
    };

    let mut report = ImportReport::default();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        match parse_uri(line) {
            Ok(record) => report.records.push(record),
            Err(e) => {
                debug!(line = idx + 1, error = %e, "skipping unparseable subscription line");
                report.failures.push((idx + 1, e));
            }
        }
    }
    report
}
