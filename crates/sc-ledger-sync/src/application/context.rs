//! Session context shared by the sync loop, the dispatcher and the session.
//!
//! Holds the externally supplied actor, the current epoch and the closed
//! flag. Results produced under an older epoch, or after close, are stale.
//!
//! Epoch changes and close take the gate exclusively, so a publish made
//! through [`SessionContext::publish_if_current`] either completes before
//! them or does not happen at all.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

use crate::domain::ActorId;

/// Shared session state.
#[derive(Debug)]
pub struct SessionContext {
    actor: watch::Receiver<Option<ActorId>>,
    epoch: AtomicU64,
    closed: AtomicBool,
    gate: RwLock<()>,
}

impl SessionContext {
    /// Create a context reading the actor from `actor`.
    pub fn new(actor: watch::Receiver<Option<ActorId>>) -> Self {
        Self {
            actor,
            epoch: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            gate: RwLock::new(()),
        }
    }

    /// The actor as supplied right now.
    pub fn current_actor(&self) -> Option<ActorId> {
        *self.actor.borrow()
    }

    /// A fresh handle on the actor input (for change notification).
    pub fn actor_receiver(&self) -> watch::Receiver<Option<ActorId>> {
        self.actor.clone()
    }

    /// Current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Start a new epoch, invalidating everything begun under the old one.
    pub fn advance_epoch(&self) -> u64 {
        let _gate = self.gate.write();
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether work begun under `epoch` may still publish its result.
    pub fn is_current(&self, epoch: u64) -> bool {
        !self.is_closed() && self.epoch() == epoch
    }

    /// Mark the session ended.
    pub fn close(&self) {
        let _gate = self.gate.write();
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether the session has ended.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Run `publish` only if `epoch` is still current, holding off epoch
    /// changes and close until it returns.
    ///
    /// `publish` must not call back into the context's writers.
    pub fn publish_if_current<R>(&self, epoch: u64, publish: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.gate.read();
        self.is_current(epoch).then(publish)
    }

    /// Run `publish` only while the session is open.
    pub fn publish_while_open<R>(&self, publish: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.gate.read();
        (!self.is_closed()).then(publish)
    }
}
