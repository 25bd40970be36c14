//! # Outbound Ports
//!
//! Traits for the engine's collaborators: the remote ledger and whatever
//! presents state to the user.

use crate::domain::{
    ActorId, ClientError, DispatchKey, GatewayError, RecordDto, RecordId, Snapshot,
    TransactionResult,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use std::collections::BTreeSet;

/// Ledger gateway - outbound port.
///
/// Every call may fail with a transport or rejection error. Submissions are
/// made on behalf of `from`.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Total number of records ever created.
    async fn count(&self) -> Result<u64, GatewayError>;

    /// Fetch one record by index.
    async fn get(&self, index: RecordId) -> Result<RecordDto, GatewayError>;

    /// Register a new record.
    async fn submit_create(
        &self,
        name: &str,
        cost: U256,
        from: &ActorId,
    ) -> Result<TransactionResult, GatewayError>;

    /// Pay for a record, attaching `value`.
    async fn submit_pay(
        &self,
        index: RecordId,
        value: U256,
        from: &ActorId,
    ) -> Result<TransactionResult, GatewayError>;

    /// Mark a record as delivered.
    async fn submit_deliver(
        &self,
        index: RecordId,
        from: &ActorId,
    ) -> Result<TransactionResult, GatewayError>;

    /// Gateway identifier (for logging).
    fn gateway_id(&self) -> &str;
}

/// Presentation sink - outbound port.
///
/// Receives state to display. The engine never depends on how it is rendered.
pub trait PresentationSink: Send + Sync {
    /// Called after every completed sync.
    fn publish_snapshot(&self, snapshot: &Snapshot);

    /// Called whenever the set of in-flight dispatches changes.
    fn publish_in_flight(&self, in_flight: &BTreeSet<DispatchKey>);

    /// Called for every validation, gateway and sync error.
    fn report_error(&self, error: &ClientError);
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Sink that records everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    snapshots: Mutex<Vec<Snapshot>>,
    in_flight: Mutex<Vec<BTreeSet<DispatchKey>>>,
    errors: Mutex<Vec<ClientError>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots published so far.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.lock().clone()
    }

    /// Most recent snapshot, if any.
    pub fn last_snapshot(&self) -> Option<Snapshot> {
        self.snapshots.lock().last().cloned()
    }

    /// All in-flight sets published so far.
    pub fn in_flight_updates(&self) -> Vec<BTreeSet<DispatchKey>> {
        self.in_flight.lock().clone()
    }

    /// All errors reported so far.
    pub fn errors(&self) -> Vec<ClientError> {
        self.errors.lock().clone()
    }
}

impl PresentationSink for RecordingSink {
    fn publish_snapshot(&self, snapshot: &Snapshot) {
        self.snapshots.lock().push(snapshot.clone());
    }

    fn publish_in_flight(&self, in_flight: &BTreeSet<DispatchKey>) {
        self.in_flight.lock().push(in_flight.clone());
    }

    fn report_error(&self, error: &ClientError) {
        self.errors.lock().push(error.clone());
    }
}
