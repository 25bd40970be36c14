//! Snapshot cache.
//!
//! Holds the last-known snapshot behind an `Arc` so readers get a complete
//! snapshot or the previous one, never a partial build. Only the sync loop
//! writes to it.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::domain::Snapshot;

/// Last-known snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotCache {
    /// Cache holding an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Swap in a new snapshot and return it.
    pub(crate) fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Arc::clone(&snapshot);
        snapshot
    }
}
