//! Prometheus metrics for the supply-chain client.
//!
//! All metrics follow the naming convention: `sc_<area>_<metric>[_total]`

use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Sync rounds by outcome (completed, failed)
    pub static ref SYNC_ROUNDS: IntCounterVec = IntCounterVec::new(
        Opts::new("sc_sync_rounds_total", "Total sync rounds by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Dispatches by action and outcome (succeeded, rejected, failed)
    pub static ref DISPATCHES: IntCounterVec = IntCounterVec::new(
        Opts::new("sc_dispatch_total", "Total dispatched actions by outcome"),
        &["action", "outcome"]
    ).expect("metric creation failed");

    /// Records in the current snapshot
    pub static ref RECORDS_TRACKED: IntGauge = IntGauge::new(
        "sc_records_tracked",
        "Number of records in the current snapshot"
    ).expect("metric creation failed");

    /// Dispatches awaiting the ledger
    pub static ref DISPATCH_IN_FLIGHT: IntGauge = IntGauge::new(
        "sc_dispatch_in_flight",
        "Number of submissions awaiting a ledger answer"
    ).expect("metric creation failed");

    /// Unix time of the last completed sync
    pub static ref LAST_SYNC_TIMESTAMP: Gauge = Gauge::new(
        "sc_sync_last_success_timestamp_seconds",
        "Unix time of the last completed sync"
    ).expect("metric creation failed");
}

/// Proof that the metrics are registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _private: (),
}

impl MetricsHandle {
    /// Encode all metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        encode_metrics()
    }
}

/// Register all metrics with the global registry.
///
/// Calling it more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SYNC_ROUNDS.clone()),
        Box::new(DISPATCHES.clone()),
        Box::new(RECORDS_TRACKED.clone()),
        Box::new(DISPATCH_IN_FLIGHT.clone()),
        Box::new(LAST_SYNC_TIMESTAMP.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _private: () })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
