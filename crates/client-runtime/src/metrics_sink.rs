//! Presentation sink that feeds the Prometheus metrics.

use sc_ledger_sync::{
    ActionKind, ClientError, DispatchError, DispatchKey, PresentationSink, Snapshot,
    TransactionResult,
};
use sc_telemetry::{
    metric_inc, DISPATCHES, DISPATCH_IN_FLIGHT, LAST_SYNC_TIMESTAMP, RECORDS_TRACKED,
    SYNC_ROUNDS,
};
use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Updates sync and in-flight metrics from what the session publishes.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsSink;

impl MetricsSink {
    /// Create a metrics sink.
    pub fn new() -> Self {
        Self
    }
}

impl PresentationSink for MetricsSink {
    fn publish_snapshot(&self, snapshot: &Snapshot) {
        metric_inc!(SYNC_ROUNDS, &["completed"]);
        RECORDS_TRACKED.set(snapshot.len() as i64);
        if let Ok(now) = SystemTime::now().duration_since(UNIX_EPOCH) {
            LAST_SYNC_TIMESTAMP.set(now.as_secs_f64());
        }
    }

    fn publish_in_flight(&self, in_flight: &BTreeSet<DispatchKey>) {
        DISPATCH_IN_FLIGHT.set(in_flight.len() as i64);
    }

    fn report_error(&self, error: &ClientError) {
        // Dispatch outcomes are counted by `record_dispatch`
        if let ClientError::Sync(_) = error {
            metric_inc!(SYNC_ROUNDS, &["failed"]);
        }
    }
}

/// Count one dispatch outcome.
pub fn record_dispatch(action: ActionKind, result: &Result<TransactionResult, DispatchError>) {
    let outcome = match result {
        Ok(_) => "succeeded",
        Err(e) if e.is_rejection() => "rejected",
        Err(_) => "failed",
    };
    metric_inc!(DISPATCHES, &[action.as_str(), outcome]);
}
