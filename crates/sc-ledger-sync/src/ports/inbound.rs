//! # Inbound Ports
//!
//! API trait defining what the supply-chain client can do.

use async_trait::async_trait;
use primitive_types::U256;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::SyncOutcome;
use crate::domain::{DispatchError, DispatchKey, RecordId, Snapshot, TransactionResult};

/// Supply-chain client API - inbound port.
#[async_trait]
pub trait SupplyChainApi: Send + Sync {
    /// Register a new record on the ledger.
    async fn create(&self, name: &str, cost: U256) -> Result<TransactionResult, DispatchError>;

    /// Pay for a record in state `Created`, attaching its cost.
    async fn pay(&self, record_id: RecordId) -> Result<TransactionResult, DispatchError>;

    /// Deliver a record in state `Paid`.
    async fn deliver(&self, record_id: RecordId) -> Result<TransactionResult, DispatchError>;

    /// Run a sync round now (coalesced with any running one).
    async fn sync_now(&self) -> SyncOutcome;

    /// Latest snapshot.
    fn snapshot(&self) -> Arc<Snapshot>;

    /// Dispatches currently outstanding.
    fn in_flight(&self) -> BTreeSet<DispatchKey>;
}
