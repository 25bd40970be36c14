//! # Action Dispatcher
//!
//! Validates create / pay / deliver against the current snapshot and actor,
//! guards each submission with the dispatch tracker, submits through the
//! ledger gateway and re-syncs once the gateway has answered.
//!
//! ## Flow
//!
//! ```text
//! session open? ──no──→ SessionClosed (no flag, no gateway call)
//!    │
//!    ↓
//! validate ──fail──→ ValidationError (no flag, no gateway call)
//!    │
//!    ↓
//! tracker.begin ──taken──→ AlreadyInFlight (no gateway call)
//!    │
//!    ↓
//! gateway.submit_* ──→ tracker.end ──→ sync_now ──→ Ok(receipt) / GatewayError
//! ```
//!
//! Local state is never advanced here. The snapshot only changes when the
//! triggered sync brings back what the ledger now holds.

use primitive_types::U256;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::SnapshotCache;
use super::context::SessionContext;
use super::sync_loop::SyncLoop;
use super::tracker::DispatchTracker;
use crate::algorithms::{validate_create, validate_deliver, validate_pay};
use crate::domain::{
    ActionKind, ClientError, DispatchError, DispatchKey, GatewayError, RecordId,
    TransactionResult, ValidationError,
};
use crate::ports::{LedgerGateway, PresentationSink};

/// Dispatch counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Calls that reached the gateway
    pub submitted: AtomicU64,
    /// Gateway calls that succeeded
    pub succeeded: AtomicU64,
    /// Gateway calls that failed
    pub failed: AtomicU64,
    /// Calls turned down before the gateway (validation or in flight)
    pub rejected: AtomicU64,
}

/// Action dispatcher. Owns the dispatch tracker.
pub struct ActionDispatcher {
    gateway: Arc<dyn LedgerGateway>,
    cache: Arc<SnapshotCache>,
    sync: Arc<SyncLoop>,
    sink: Arc<dyn PresentationSink>,
    context: Arc<SessionContext>,
    tracker: DispatchTracker,
    max_name_len: usize,
    stats: DispatchStats,
}

impl ActionDispatcher {
    /// Create a dispatcher.
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        cache: Arc<SnapshotCache>,
        sync: Arc<SyncLoop>,
        sink: Arc<dyn PresentationSink>,
        context: Arc<SessionContext>,
        max_name_len: usize,
    ) -> Self {
        Self {
            gateway,
            cache,
            sync,
            tracker: DispatchTracker::with_observer(Arc::clone(&sink), Arc::clone(&context)),
            sink,
            context,
            max_name_len,
            stats: DispatchStats::default(),
        }
    }

    /// The dispatch tracker.
    pub fn tracker(&self) -> &DispatchTracker {
        &self.tracker
    }

    /// Counters.
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Register a new record.
    pub async fn create(
        &self,
        name: &str,
        cost: U256,
    ) -> Result<TransactionResult, DispatchError> {
        self.ensure_open(ActionKind::Create)?;
        let actor = validate_create(name, self.max_name_len, self.context.current_actor())
            .map_err(|e| self.reject_invalid(ActionKind::Create, e))?;

        let result = {
            let _guard = self
                .tracker
                .guard(DispatchKey::Create)
                .map_err(|e| self.reject(e))?;
            self.stats.submitted.fetch_add(1, Ordering::Relaxed);
            info!(name, cost = %cost, "[sc-dispatch] Submitting create");
            self.gateway.submit_create(name, cost, &actor).await
        };

        self.settle(ActionKind::Create, None, result).await
    }

    /// Pay for a record in state `Created`, attaching its cost.
    pub async fn pay(&self, record_id: RecordId) -> Result<TransactionResult, DispatchError> {
        self.ensure_open(ActionKind::Pay)?;
        let actor = self.context.current_actor();
        let snapshot = self.cache.load();
        let cost = validate_pay(&snapshot, record_id, actor.as_ref())
            .map(|record| record.cost)
            .map_err(|e| self.reject_invalid(ActionKind::Pay, e))?;
        let actor = actor
            .ok_or_else(|| self.reject_invalid(ActionKind::Pay, ValidationError::NoActiveActor))?;

        let result = {
            let _guard = self
                .tracker
                .guard(DispatchKey::Pay(record_id))
                .map_err(|e| self.reject(e))?;
            self.stats.submitted.fetch_add(1, Ordering::Relaxed);
            info!(record_id, value = %cost, "[sc-dispatch] Submitting payment");
            self.gateway.submit_pay(record_id, cost, &actor).await
        };

        self.settle(ActionKind::Pay, Some(record_id), result).await
    }

    /// Deliver a record in state `Paid`.
    pub async fn deliver(&self, record_id: RecordId) -> Result<TransactionResult, DispatchError> {
        self.ensure_open(ActionKind::Deliver)?;
        let actor = self.context.current_actor();
        let snapshot = self.cache.load();
        validate_deliver(&snapshot, record_id, actor.as_ref())
            .map_err(|e| self.reject_invalid(ActionKind::Deliver, e))?;
        let actor = actor.ok_or_else(|| {
            self.reject_invalid(ActionKind::Deliver, ValidationError::NoActiveActor)
        })?;

        let result = {
            let _guard = self
                .tracker
                .guard(DispatchKey::Deliver(record_id))
                .map_err(|e| self.reject(e))?;
            self.stats.submitted.fetch_add(1, Ordering::Relaxed);
            info!(record_id, "[sc-dispatch] Submitting delivery");
            self.gateway.submit_deliver(record_id, &actor).await
        };

        self.settle(ActionKind::Deliver, Some(record_id), result).await
    }

    /// The gateway has answered and the in-flight mark is already cleared:
    /// re-sync, then surface the outcome.
    async fn settle(
        &self,
        action: ActionKind,
        record_id: Option<RecordId>,
        result: Result<TransactionResult, GatewayError>,
    ) -> Result<TransactionResult, DispatchError> {
        let outcome = self.sync.sync_now().await;
        debug!(action = %action, outcome = ?outcome, "[sc-dispatch] Post-dispatch sync");

        match result {
            Ok(receipt) => {
                self.stats.succeeded.fetch_add(1, Ordering::Relaxed);
                info!(
                    action = %action,
                    record_id = ?record_id,
                    tx_hash = ?receipt.tx_hash,
                    block = receipt.block_number,
                    "[sc-dispatch] Transaction confirmed"
                );
                Ok(receipt)
            }
            Err(source) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    action = %action,
                    record_id = ?record_id,
                    error = %source,
                    "[sc-dispatch] Transaction failed"
                );
                let err = DispatchError::Gateway { action, source };
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Nothing reaches the gateway once the session has ended.
    fn ensure_open(&self, action: ActionKind) -> Result<(), DispatchError> {
        if self.context.is_closed() {
            return Err(self.reject_invalid(action, ValidationError::SessionClosed));
        }
        Ok(())
    }

    fn reject_invalid(&self, action: ActionKind, err: ValidationError) -> DispatchError {
        debug!(action = %action, reason = %err, "[sc-dispatch] Rejected");
        self.reject(DispatchError::Validation(err))
    }

    fn reject(&self, err: DispatchError) -> DispatchError {
        self.stats.rejected.fetch_add(1, Ordering::Relaxed);
        if let DispatchError::AlreadyInFlight(key) = &err {
            debug!(key = %key, "[sc-dispatch] Rejected, already in flight");
        }
        self.report(&err);
        err
    }

    fn report(&self, err: &DispatchError) {
        let err = ClientError::Dispatch(err.clone());
        self.context.publish_while_open(|| self.sink.report_error(&err));
    }
}
