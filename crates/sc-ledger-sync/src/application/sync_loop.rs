//! # Sync Loop
//!
//! Pulls the full record set from the ledger and swaps it into the snapshot
//! cache, periodically and on demand.
//!
//! ## Guarantees
//!
//! - At most one sync runs at a time. A trigger that arrives while one is
//!   running is dropped (coalesced), not queued.
//! - A failed sync leaves the previous snapshot in place and does not stop
//!   the timer.
//! - A result fetched under an older epoch is discarded and fetched again
//!   for the current one. After the session ended nothing is published.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::cache::SnapshotCache;
use super::context::SessionContext;
use crate::algorithms::fetch_snapshot;
use crate::domain::{find_state_regressions, ClientError, Snapshot, SyncError};
use crate::ports::{LedgerGateway, PresentationSink};

/// Outcome of one sync trigger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The snapshot was replaced.
    Completed {
        /// Records in the new snapshot
        records: usize,
    },
    /// Another sync was already running; this trigger was dropped.
    Coalesced,
    /// The fetch failed; the previous snapshot is still current.
    Failed(SyncError),
    /// The session ended; the result was thrown away.
    Discarded,
}

impl SyncOutcome {
    /// True if the cache now holds a freshly fetched snapshot.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Sync counters.
#[derive(Debug, Default)]
pub struct SyncStats {
    /// Syncs that replaced the snapshot
    pub completed: AtomicU64,
    /// Syncs that failed
    pub failed: AtomicU64,
    /// Triggers dropped because a sync was running
    pub coalesced: AtomicU64,
    /// Results thrown away as stale or after the session ended
    pub discarded: AtomicU64,
}

/// Clears the in-progress flag when dropped, including on cancellation.
struct SyncSlot<'a>(&'a AtomicBool);

impl<'a> SyncSlot<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SyncSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The sync engine. Sole writer of the snapshot cache.
pub struct SyncLoop {
    gateway: Arc<dyn LedgerGateway>,
    cache: Arc<SnapshotCache>,
    sink: Arc<dyn PresentationSink>,
    context: Arc<SessionContext>,
    in_progress: AtomicBool,
    stats: SyncStats,
}

impl SyncLoop {
    /// Create a sync loop.
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        cache: Arc<SnapshotCache>,
        sink: Arc<dyn PresentationSink>,
        context: Arc<SessionContext>,
    ) -> Self {
        Self {
            gateway,
            cache,
            sink,
            context,
            in_progress: AtomicBool::new(false),
            stats: SyncStats::default(),
        }
    }

    /// Counters.
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Whether a sync is running right now.
    pub fn is_syncing(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Run one sync round, unless one is already running.
    ///
    /// If the epoch moves on while the fetch is out, the result is thrown
    /// away and the fetch repeated for the new epoch before the slot is
    /// released.
    pub async fn sync_now(&self) -> SyncOutcome {
        let Some(_slot) = SyncSlot::acquire(&self.in_progress) else {
            self.stats.coalesced.fetch_add(1, Ordering::Relaxed);
            debug!("[sc-sync] Sync already running, trigger coalesced");
            return SyncOutcome::Coalesced;
        };

        if self.context.is_closed() {
            return self.discard("session ended");
        }

        loop {
            let epoch = self.context.epoch();
            let owner = self.context.current_actor();
            let result = fetch_snapshot(self.gateway.as_ref(), owner, epoch).await;

            let published = match result {
                Ok(snapshot) => self.context.publish_if_current(epoch, || self.publish(snapshot)),
                Err(e) => self.context.publish_if_current(epoch, || self.fail(e)),
            };
            if let Some(outcome) = published {
                return outcome;
            }

            if self.context.is_closed() {
                return self.discard("session ended");
            }
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(epoch, "[sc-sync] Epoch moved on during sync, fetching again");
        }
    }

    fn publish(&self, snapshot: Snapshot) -> SyncOutcome {
        let previous = self.cache.load();
        for regression in find_state_regressions(&previous, &snapshot) {
            warn!(
                record_id = regression.id,
                previous = %regression.previous,
                current = %regression.current,
                "[sc-sync] Ledger reported a state regression"
            );
        }

        let snapshot = self.cache.replace(snapshot);
        self.stats.completed.fetch_add(1, Ordering::Relaxed);
        debug!(
            records = snapshot.len(),
            epoch = snapshot.epoch(),
            gateway = self.gateway.gateway_id(),
            "[sc-sync] Snapshot replaced"
        );
        self.sink.publish_snapshot(&snapshot);
        SyncOutcome::Completed {
            records: snapshot.len(),
        }
    }

    fn fail(&self, e: SyncError) -> SyncOutcome {
        self.stats.failed.fetch_add(1, Ordering::Relaxed);
        warn!(
            error = %e,
            gateway = self.gateway.gateway_id(),
            "[sc-sync] Sync failed, keeping previous snapshot"
        );
        self.sink.report_error(&ClientError::Sync(e.clone()));
        SyncOutcome::Failed(e)
    }

    fn discard(&self, reason: &str) -> SyncOutcome {
        self.stats.discarded.fetch_add(1, Ordering::Relaxed);
        debug!(reason, "[sc-sync] Sync result discarded");
        SyncOutcome::Discarded
    }

    /// Run the periodic loop until `shutdown` flips to true or its sender is
    /// dropped.
    ///
    /// When `immediate` is set the first round runs at once, otherwise after
    /// one full interval. A round in progress is abandoned on shutdown.
    pub async fn run(
        self: Arc<Self>,
        interval: Duration,
        immediate: bool,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let start = if immediate {
            Instant::now()
        } else {
            Instant::now() + interval
        };
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_ms = interval.as_millis() as u64,
            epoch = self.context.epoch(),
            "[sc-sync] Sync loop started"
        );

        'run: loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.sync_now() => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                break 'run;
                            }
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break 'run;
                    }
                }
            }
        }

        info!(epoch = self.context.epoch(), "[sc-sync] Sync loop stopped");
    }
}
