//! # Client Session
//!
//! Wires the snapshot cache, sync loop and action dispatcher around one
//! gateway and one presentation sink, and owns the lifetime of the periodic
//! loop.
//!
//! ## Lifecycle
//!
//! ```text
//! new ──→ start ──→ [loop running] ──actor change──→ epoch+1, restart, sync at once
//!                         │
//!                         └──shutdown / drop / actor source gone──→ closed
//! ```
//!
//! Once closed, late results are discarded and nothing more is published.
//! New dispatches are refused. In-flight gateway calls are not cancelled.

use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cache::SnapshotCache;
use super::context::SessionContext;
use super::dispatcher::{ActionDispatcher, DispatchStats};
use super::sync_loop::{SyncLoop, SyncOutcome, SyncStats};
use crate::config::SyncConfig;
use crate::domain::{ActorId, DispatchError, DispatchKey, RecordId, Snapshot, TransactionResult};
use crate::ports::{LedgerGateway, PresentationSink, SupplyChainApi};

/// One client session against one ledger.
pub struct ClientSession {
    config: SyncConfig,
    context: Arc<SessionContext>,
    cache: Arc<SnapshotCache>,
    sync: Arc<SyncLoop>,
    dispatcher: ActionDispatcher,
    shutdown_tx: watch::Sender<bool>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl ClientSession {
    /// Build a session. Nothing runs until [`ClientSession::start`].
    pub fn new(
        config: SyncConfig,
        gateway: Arc<dyn LedgerGateway>,
        sink: Arc<dyn PresentationSink>,
        actor: watch::Receiver<Option<ActorId>>,
    ) -> Self {
        let context = Arc::new(SessionContext::new(actor));
        let cache = Arc::new(SnapshotCache::new());
        let sync = Arc::new(SyncLoop::new(
            Arc::clone(&gateway),
            Arc::clone(&cache),
            Arc::clone(&sink),
            Arc::clone(&context),
        ));
        let dispatcher = ActionDispatcher::new(
            gateway,
            Arc::clone(&cache),
            Arc::clone(&sync),
            sink,
            Arc::clone(&context),
            config.max_name_len,
        );
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            context,
            cache,
            sync,
            dispatcher,
            shutdown_tx,
            supervisor: Mutex::new(None),
        }
    }

    /// Start the periodic loop. Must be called inside a Tokio runtime.
    ///
    /// Calling it again while running, or after shutdown, does nothing.
    pub fn start(&self) {
        let mut supervisor = self.supervisor.lock();
        if supervisor.is_some() || self.context.is_closed() {
            debug!("[sc-sync] Session already started or closed");
            return;
        }

        let mut actor_rx = self.context.actor_receiver();
        let _ = actor_rx.borrow_and_update();

        info!(
            interval_ms = self.config.sync_interval_ms,
            actor = ?self.context.current_actor(),
            "[sc-sync] Session started"
        );
        *supervisor = Some(tokio::spawn(supervise(
            Arc::clone(&self.sync),
            Arc::clone(&self.context),
            self.config.sync_interval(),
            self.config.sync_on_start,
            actor_rx,
            self.shutdown_tx.subscribe(),
        )));
    }

    /// End the session and wait for the loop to stop. Idempotent.
    pub async fn shutdown(&self) {
        self.context.close();
        self.shutdown_tx.send_replace(true);

        let handle = self.supervisor.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "[sc-sync] Session supervisor ended abnormally");
            }
            info!("[sc-sync] Session shut down");
        }
    }

    /// Whether the periodic loop is running.
    pub fn is_running(&self) -> bool {
        self.supervisor
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Whether the session has ended.
    pub fn is_closed(&self) -> bool {
        self.context.is_closed()
    }

    /// Register a new record.
    pub async fn create(
        &self,
        name: &str,
        cost: U256,
    ) -> Result<TransactionResult, DispatchError> {
        self.dispatcher.create(name, cost).await
    }

    /// Pay for a record.
    pub async fn pay(&self, record_id: RecordId) -> Result<TransactionResult, DispatchError> {
        self.dispatcher.pay(record_id).await
    }

    /// Deliver a record.
    pub async fn deliver(&self, record_id: RecordId) -> Result<TransactionResult, DispatchError> {
        self.dispatcher.deliver(record_id).await
    }

    /// Trigger a sync outside the timer.
    pub async fn sync_now(&self) -> SyncOutcome {
        self.sync.sync_now().await
    }

    /// The last-known snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.cache.load()
    }

    /// Keys currently in flight.
    pub fn in_flight(&self) -> BTreeSet<DispatchKey> {
        self.dispatcher.tracker().in_flight()
    }

    /// Whether `key` is in flight, for disabling the matching control.
    pub fn is_in_flight(&self, key: &DispatchKey) -> bool {
        self.dispatcher.tracker().contains(key)
    }

    /// The actor as supplied right now.
    pub fn current_actor(&self) -> Option<ActorId> {
        self.context.current_actor()
    }

    /// Current epoch. Bumped on every actor change.
    pub fn epoch(&self) -> u64 {
        self.context.epoch()
    }

    /// Sync counters.
    pub fn sync_stats(&self) -> &SyncStats {
        self.sync.stats()
    }

    /// Dispatch counters.
    pub fn dispatch_stats(&self) -> &DispatchStats {
        self.dispatcher.stats()
    }

    /// Session configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.context.close();
        self.shutdown_tx.send_replace(true);
    }
}

/// Runs the sync loop, restarting it under a new epoch whenever the actor
/// changes. Exits on shutdown or when the actor source goes away.
async fn supervise(
    sync: Arc<SyncLoop>,
    context: Arc<SessionContext>,
    interval: Duration,
    sync_on_start: bool,
    mut actor_rx: watch::Receiver<Option<ActorId>>,
    shutdown: watch::Receiver<bool>,
) {
    let mut immediate = sync_on_start;

    loop {
        let actor_changed = tokio::select! {
            _ = Arc::clone(&sync).run(interval, immediate, shutdown.clone()) => false,
            changed = actor_rx.changed() => changed.is_ok(),
        };
        if !actor_changed {
            break;
        }

        let actor = *actor_rx.borrow_and_update();
        let epoch = context.advance_epoch();
        info!(actor = ?actor, epoch, "[sc-sync] Actor changed, restarting sync loop");
        immediate = true;
    }

    // Covers the actor source going away; a no-op after shutdown
    context.close();
}

#[async_trait]
impl SupplyChainApi for ClientSession {
    async fn create(&self, name: &str, cost: U256) -> Result<TransactionResult, DispatchError> {
        ClientSession::create(self, name, cost).await
    }

    async fn pay(&self, record_id: RecordId) -> Result<TransactionResult, DispatchError> {
        ClientSession::pay(self, record_id).await
    }

    async fn deliver(&self, record_id: RecordId) -> Result<TransactionResult, DispatchError> {
        ClientSession::deliver(self, record_id).await
    }

    async fn sync_now(&self) -> SyncOutcome {
        ClientSession::sync_now(self).await
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        ClientSession::snapshot(self)
    }

    fn in_flight(&self) -> BTreeSet<DispatchKey> {
        ClientSession::in_flight(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use crate::domain::RecordState;
    use crate::ports::RecordingSink;

    const ALICE: ActorId = ActorId::new([0xa1; 20]);
    const BOB: ActorId = ActorId::new([0xb0; 20]);

    fn session(
        config: SyncConfig,
    ) -> (
        ClientSession,
        Arc<InMemoryLedger>,
        Arc<RecordingSink>,
        watch::Sender<Option<ActorId>>,
    ) {
        let ledger = Arc::new(InMemoryLedger::new());
        let sink = Arc::new(RecordingSink::new());
        let (actor_tx, actor_rx) = watch::channel(Some(ALICE));
        let session = ClientSession::new(config, ledger.clone(), sink.clone(), actor_rx);
        (session, ledger, sink, actor_tx)
    }

    fn config(interval_ms: u64, sync_on_start: bool) -> SyncConfig {
        SyncConfig {
            sync_interval_ms: interval_ms,
            sync_on_start,
            ..SyncConfig::default()
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_syncs_immediately() {
        let (session, ledger, sink, _actor) = session(config(2000, true));
        ledger.seed("Widget", U256::from(100), RecordState::Created);

        session.start();
        settle().await;

        assert!(session.is_running());
        assert_eq!(session.snapshot().len(), 1);
        assert_eq!(sink.snapshots().len(), 1);
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_first_sync() {
        let (session, ledger, _sink, _actor) = session(config(2000, false));

        session.start();
        settle().await;
        assert_eq!(ledger.calls().count, 0);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(ledger.calls().count, 1);
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_timer() {
        let (session, ledger, _sink, _actor) = session(config(2000, true));

        session.start();
        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(ledger.calls().count, 3);

        session.shutdown().await;
        session.shutdown().await;
        assert!(!session.is_running());
        assert!(session.is_closed());

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(ledger.calls().count, 3);
        assert_eq!(session.sync_now().await, SyncOutcome::Discarded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_after_shutdown_is_noop() {
        let (session, ledger, _sink, _actor) = session(config(2000, true));
        session.shutdown().await;

        session.start();
        settle().await;

        assert!(!session.is_running());
        assert_eq!(ledger.calls().count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_actor_change_restarts_under_new_epoch() {
        let (session, ledger, _sink, actor) = session(config(2000, true));
        ledger.seed("Widget", U256::from(100), RecordState::Created);

        session.start();
        settle().await;
        assert_eq!(session.snapshot().get(0).unwrap().owner, Some(ALICE));
        assert_eq!(session.epoch(), 0);

        actor.send(Some(BOB)).unwrap();
        settle().await;

        assert_eq!(session.epoch(), 1);
        assert_eq!(ledger.calls().count, 2);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.epoch(), 1);
        assert_eq!(snapshot.get(0).unwrap().owner, Some(BOB));
        assert!(session.is_running());
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_actor_source_gone_ends_session() {
        let (session, _ledger, _sink, actor) = session(config(2000, true));

        session.start();
        settle().await;
        drop(actor);
        settle().await;

        assert!(session.is_closed());
        assert!(!session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_through_session() {
        let (session, ledger, _sink, _actor) = session(config(2000, true));
        session.start();
        settle().await;

        session.create("Crate", U256::from(9)).await.unwrap();
        session.pay(0).await.unwrap();

        assert_eq!(ledger.state_of(0), Some(RecordState::Paid));
        assert_eq!(session.snapshot().get(0).unwrap().state, RecordState::Paid);
        assert!(session.in_flight().is_empty());
        assert!(!session.is_in_flight(&DispatchKey::Pay(0)));
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_usable_through_port() {
        let (session, _ledger, _sink, _actor) = session(SyncConfig::for_testing());
        let api: &dyn SupplyChainApi = &session;

        api.create("Widget", U256::from(3)).await.unwrap();
        assert_eq!(api.snapshot().len(), 1);
        assert!(api.in_flight().is_empty());
    }
}
