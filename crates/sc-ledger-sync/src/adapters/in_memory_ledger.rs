//! In-Memory Ledger Adapter
//!
//! Implements `LedgerGateway` against a process-local item table that
//! enforces the same rules as the remote supply-chain ledger:
//! items start `Created`, payment must attach exactly the item cost, and
//! delivery requires a paid item.
//!
//! Used as a local devnet by the client runtime and as a controllable
//! gateway in tests (fault injection, call counters, read and submission
//! gates).

use crate::domain::{
    invariant_legal_transition, ActorId, GatewayError, RecordDto, RecordId, RecordState,
    TransactionResult,
};
use crate::ports::outbound::LedgerGateway;
use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// One item as stored by the ledger.
#[derive(Clone, Debug)]
struct LedgerItem {
    name: String,
    cost: U256,
    state: RecordState,
}

/// Failures to inject into gateway calls.
#[derive(Clone, Debug, Default)]
pub struct FaultPlan {
    /// `count()` fails with a transport error.
    pub fail_count: bool,
    /// `get(i)` fails with a transport error for this index.
    pub fail_get_at: Option<RecordId>,
    /// `get(i)` reports an out-of-range state ordinal for this index.
    pub corrupt_state_at: Option<RecordId>,
    /// Every submission fails with a transport error.
    pub fail_submits: bool,
}

/// Number of calls received per gateway method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerCalls {
    /// `count()` calls
    pub count: u64,
    /// `get()` calls
    pub get: u64,
    /// `submit_create()` calls
    pub create: u64,
    /// `submit_pay()` calls
    pub pay: u64,
    /// `submit_deliver()` calls
    pub deliver: u64,
}

#[derive(Debug, Default)]
struct CallCounters {
    count: AtomicU64,
    get: AtomicU64,
    create: AtomicU64,
    pay: AtomicU64,
    deliver: AtomicU64,
}

/// Process-local ledger.
#[derive(Debug)]
pub struct InMemoryLedger {
    id: String,
    items: Mutex<Vec<LedgerItem>>,
    faults: Mutex<FaultPlan>,
    calls: CallCounters,
    nonce: AtomicU64,
    read_gate: Mutex<Option<Arc<Semaphore>>>,
    submit_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::with_id("in-memory-ledger")
    }

    /// Create an empty ledger with a custom identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            items: Mutex::new(Vec::new()),
            faults: Mutex::new(FaultPlan::default()),
            calls: CallCounters::default(),
            nonce: AtomicU64::new(0),
            read_gate: Mutex::new(None),
            submit_gate: Mutex::new(None),
        }
    }

    /// Insert an item directly, bypassing submission. Returns its index.
    pub fn seed(&self, name: impl Into<String>, cost: U256, state: RecordState) -> RecordId {
        let mut items = self.items.lock();
        items.push(LedgerItem {
            name: name.into(),
            cost,
            state,
        });
        (items.len() - 1) as RecordId
    }

    /// Overwrite an item's state, bypassing the lifecycle rules.
    ///
    /// Returns false if the index does not exist.
    pub fn force_state(&self, index: RecordId, state: RecordState) -> bool {
        let mut items = self.items.lock();
        match usize::try_from(index).ok().and_then(|i| items.get_mut(i)) {
            Some(item) => {
                item.state = state;
                true
            }
            None => false,
        }
    }

    /// State of an item as the ledger holds it.
    pub fn state_of(&self, index: RecordId) -> Option<RecordState> {
        let items = self.items.lock();
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .map(|item| item.state)
    }

    /// Number of items held.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// True when no item was ever created.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Mutable access to the fault plan.
    pub fn faults(&self) -> MutexGuard<'_, FaultPlan> {
        self.faults.lock()
    }

    /// Calls received so far.
    pub fn calls(&self) -> LedgerCalls {
        LedgerCalls {
            count: self.calls.count.load(Ordering::SeqCst),
            get: self.calls.get.load(Ordering::SeqCst),
            create: self.calls.create.load(Ordering::SeqCst),
            pay: self.calls.pay.load(Ordering::SeqCst),
            deliver: self.calls.deliver.load(Ordering::SeqCst),
        }
    }

    /// Park every subsequent submission until [`release_submissions`] is called.
    ///
    /// [`release_submissions`]: Self::release_submissions
    pub fn hold_submissions(&self) {
        hold(&self.submit_gate);
    }

    /// Let parked and future submissions through.
    pub fn release_submissions(&self) {
        release(&self.submit_gate);
    }

    /// Park every subsequent `count()` until [`release_reads`] is called.
    ///
    /// [`release_reads`]: Self::release_reads
    pub fn hold_reads(&self) {
        hold(&self.read_gate);
    }

    /// Let parked and future reads through.
    pub fn release_reads(&self) {
        release(&self.read_gate);
    }

    fn check_submit_faults(&self) -> Result<(), GatewayError> {
        if self.faults.lock().fail_submits {
            return Err(GatewayError::Transport("simulated outage".to_string()));
        }
        Ok(())
    }

    fn receipt(&self, action: &str, index: RecordId) -> TransactionResult {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Keccak256::new();
        hasher.update(self.id.as_bytes());
        hasher.update(nonce.to_be_bytes());
        hasher.update(action.as_bytes());
        hasher.update(index.to_be_bytes());
        TransactionResult {
            tx_hash: H256::from_slice(&hasher.finalize()),
            block_number: nonce + 1,
        }
    }

    fn with_item<T>(
        &self,
        index: RecordId,
        f: impl FnOnce(&mut LedgerItem) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let mut items = self.items.lock();
        let item = usize::try_from(index)
            .ok()
            .and_then(|i| items.get_mut(i))
            .ok_or_else(|| GatewayError::Rejected(format!("item {} does not exist", index)))?;
        f(item)
    }
}

fn hold(gate: &Mutex<Option<Arc<Semaphore>>>) {
    *gate.lock() = Some(Arc::new(Semaphore::new(0)));
}

fn release(gate: &Mutex<Option<Arc<Semaphore>>>) {
    if let Some(gate) = gate.lock().take() {
        gate.close();
    }
}

async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
    let gate = gate.lock().clone();
    if let Some(gate) = gate {
        // A closed semaphore means the gate was released.
        let _ = gate.acquire().await;
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn count(&self) -> Result<u64, GatewayError> {
        self.calls.count.fetch_add(1, Ordering::SeqCst);
        pass(&self.read_gate).await;
        if self.faults.lock().fail_count {
            return Err(GatewayError::Transport("simulated outage".to_string()));
        }
        Ok(self.items.lock().len() as u64)
    }

    async fn get(&self, index: RecordId) -> Result<RecordDto, GatewayError> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        let (fail, corrupt) = {
            let faults = self.faults.lock();
            (
                faults.fail_get_at == Some(index),
                faults.corrupt_state_at == Some(index),
            )
        };
        if fail {
            return Err(GatewayError::Transport(format!(
                "simulated outage reading item {}",
                index
            )));
        }

        let items = self.items.lock();
        let item = usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .ok_or_else(|| GatewayError::Rejected(format!("item {} does not exist", index)))?;
        Ok(RecordDto {
            name: item.name.clone(),
            cost: item.cost,
            state_ordinal: if corrupt { u8::MAX } else { item.state.ordinal() },
        })
    }

    async fn submit_create(
        &self,
        name: &str,
        cost: U256,
        from: &ActorId,
    ) -> Result<TransactionResult, GatewayError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        pass(&self.submit_gate).await;
        self.check_submit_faults()?;

        let index = {
            let mut items = self.items.lock();
            items.push(LedgerItem {
                name: name.to_string(),
                cost,
                state: RecordState::Created,
            });
            (items.len() - 1) as RecordId
        };
        debug!("[{}] Item {} created by {}", self.id, index, from);
        Ok(self.receipt("create", index))
    }

    async fn submit_pay(
        &self,
        index: RecordId,
        value: U256,
        from: &ActorId,
    ) -> Result<TransactionResult, GatewayError> {
        self.calls.pay.fetch_add(1, Ordering::SeqCst);
        pass(&self.submit_gate).await;
        self.check_submit_faults()?;

        self.with_item(index, |item| {
            if !invariant_legal_transition(item.state, RecordState::Paid) {
                return Err(GatewayError::Rejected(format!(
                    "item {} is {}, payment not possible",
                    index, item.state
                )));
            }
            if value != item.cost {
                return Err(GatewayError::Rejected(format!(
                    "only full payments accepted: sent {}, cost {}",
                    value, item.cost
                )));
            }
            item.state = RecordState::Paid;
            Ok(())
        })?;
        debug!("[{}] Item {} paid by {}", self.id, index, from);
        Ok(self.receipt("pay", index))
    }

    async fn submit_deliver(
        &self,
        index: RecordId,
        from: &ActorId,
    ) -> Result<TransactionResult, GatewayError> {
        self.calls.deliver.fetch_add(1, Ordering::SeqCst);
        pass(&self.submit_gate).await;
        self.check_submit_faults()?;

        self.with_item(index, |item| {
            if !invariant_legal_transition(item.state, RecordState::Delivered) {
                return Err(GatewayError::Rejected(format!(
                    "item {} is {}, delivery not possible",
                    index, item.state
                )));
            }
            item.state = RecordState::Delivered;
            Ok(())
        })?;
        debug!("[{}] Item {} delivered by {}", self.id, index, from);
        Ok(self.receipt("deliver", index))
    }

    fn gateway_id(&self) -> &str {
        &self.id
    }
}
