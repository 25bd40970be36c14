//! Tracing Sink Adapter
//!
//! Implements `PresentationSink` by writing everything to the log.

use crate::domain::{ClientError, DispatchKey, Snapshot};
use crate::ports::outbound::PresentationSink;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Presentation sink that logs snapshots, in-flight sets and errors.
#[derive(Clone, Debug, Default)]
pub struct TracingSink {
    /// Log every record of each snapshot, not just a summary.
    verbose: bool,
}

impl TracingSink {
    /// Summary-only sink.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Sink that logs every record.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl PresentationSink for TracingSink {
    fn publish_snapshot(&self, snapshot: &Snapshot) {
        info!(
            records = snapshot.len(),
            epoch = snapshot.epoch(),
            "[sc-view] Snapshot updated"
        );
        if self.verbose {
            for record in snapshot {
                info!(record_id = record.id, "[sc-view] {}", record);
            }
        }
    }

    fn publish_in_flight(&self, in_flight: &BTreeSet<DispatchKey>) {
        let keys: Vec<String> = in_flight.iter().map(ToString::to_string).collect();
        debug!(in_flight = ?keys, "[sc-view] In-flight dispatches changed");
    }

    fn report_error(&self, error: &ClientError) {
        warn!(error = %error, "[sc-view] Client error");
    }
}
