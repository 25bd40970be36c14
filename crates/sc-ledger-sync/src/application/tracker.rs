//! Dispatch tracker.
//!
//! Keyed set of in-flight dispatches. `begin` refuses a key that is already
//! marked; `end` clears unconditionally. [`DispatchGuard`] ties `end` to
//! scope exit so every path out of a dispatch clears its key.
//!
//! Changes are published to the observer only while the session is open.

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

use super::context::SessionContext;
use crate::domain::{DispatchError, DispatchKey};
use crate::ports::PresentationSink;

/// In-flight dispatch bookkeeping.
#[derive(Default)]
pub struct DispatchTracker {
    in_flight: Mutex<BTreeSet<DispatchKey>>,
    observer: Option<(Arc<dyn PresentationSink>, Arc<SessionContext>)>,
}

impl DispatchTracker {
    /// Tracker without change notification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker that publishes the in-flight set to `observer` on every change
    /// until `context` is closed.
    pub fn with_observer(
        observer: Arc<dyn PresentationSink>,
        context: Arc<SessionContext>,
    ) -> Self {
        Self {
            in_flight: Mutex::new(BTreeSet::new()),
            observer: Some((observer, context)),
        }
    }

    /// Mark `key` in flight.
    ///
    /// # Errors
    /// - `AlreadyInFlight` if `key` is already marked
    pub fn begin(&self, key: DispatchKey) -> Result<(), DispatchError> {
        let current = {
            let mut in_flight = self.in_flight.lock();
            if !in_flight.insert(key) {
                return Err(DispatchError::AlreadyInFlight(key));
            }
            in_flight.clone()
        };
        trace!(key = %key, "[sc-dispatch] Marked in flight");
        self.notify(&current);
        Ok(())
    }

    /// Clear `key`. Clearing an unmarked key is a no-op.
    pub fn end(&self, key: DispatchKey) {
        let current = {
            let mut in_flight = self.in_flight.lock();
            if !in_flight.remove(&key) {
                return;
            }
            in_flight.clone()
        };
        trace!(key = %key, "[sc-dispatch] Cleared");
        self.notify(&current);
    }

    /// Mark `key` and return a guard that clears it on drop.
    pub fn guard(&self, key: DispatchKey) -> Result<DispatchGuard<'_>, DispatchError> {
        self.begin(key)?;
        Ok(DispatchGuard { tracker: self, key })
    }

    /// Whether `key` is in flight.
    pub fn contains(&self, key: &DispatchKey) -> bool {
        self.in_flight.lock().contains(key)
    }

    /// Copy of the in-flight set.
    pub fn in_flight(&self) -> BTreeSet<DispatchKey> {
        self.in_flight.lock().clone()
    }

    /// Number of keys in flight.
    pub fn len(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// True when nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.in_flight.lock().is_empty()
    }

    fn notify(&self, current: &BTreeSet<DispatchKey>) {
        if let Some((observer, context)) = &self.observer {
            context.publish_while_open(|| observer.publish_in_flight(current));
        }
    }
}

/// Clears its key from the tracker when dropped.
#[must_use = "dropping the guard clears the in-flight mark immediately"]
pub struct DispatchGuard<'a> {
    tracker: &'a DispatchTracker,
    key: DispatchKey,
}

impl DispatchGuard<'_> {
    /// Key held by this guard.
    pub fn key(&self) -> DispatchKey {
        self.key
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.tracker.end(self.key);
    }
}
