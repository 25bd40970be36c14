//! # Domain Invariants
//!
//! Rules that hold for every snapshot and every transition.

use super::entities::Snapshot;
use super::value_objects::{RecordId, RecordState};

/// Default periodic sync interval in milliseconds.
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 2000;

/// Default upper bound on record names accepted by `create`.
pub const DEFAULT_MAX_NAME_LEN: usize = 256;

/// Invariant: a transition moves exactly one step forward.
///
/// `Created -> Paid -> Delivered`; nothing leaves `Delivered`.
pub fn invariant_legal_transition(from: RecordState, to: RecordState) -> bool {
    from.next() == Some(to)
}

/// Invariant: record `i` of a snapshot has id `i`.
pub fn invariant_dense_ids(snapshot: &Snapshot) -> bool {
    snapshot
        .iter()
        .enumerate()
        .all(|(index, record)| record.id == index as RecordId)
}

/// A record whose state moved backwards between two snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateRegression {
    /// Record id
    pub id: RecordId,
    /// State in the older snapshot
    pub previous: RecordState,
    /// State in the newer snapshot
    pub current: RecordState,
}

/// Invariant: per-record state never decreases across snapshots.
///
/// The ledger is authoritative, so violations are reported rather than
/// corrected. Records missing from `current` are not regressions.
pub fn find_state_regressions(previous: &Snapshot, current: &Snapshot) -> Vec<StateRegression> {
    previous
        .iter()
        .filter_map(|old| {
            let new = current.get(old.id)?;
            (new.state < old.state).then(|| StateRegression {
                id: old.id,
                previous: old.state,
                current: new.state,
            })
        })
        .collect()
}
