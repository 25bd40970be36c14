//! # Session Lifecycle
//!
//! Actor switching, stale-result refetch and shutdown, driven through a
//! gateway that can hold a sync mid-flight.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use primitive_types::U256;
    use sc_ledger_sync::{
        ActorId, ClientSession, GatewayError, InMemoryLedger, LedgerGateway, RecordDto, RecordId,
        RecordState, RecordingSink, SyncConfig, SyncOutcome, TransactionResult,
    };
    use tokio::sync::{watch, Notify};

    const ALICE: ActorId = ActorId::new([0xa1; 20]);
    const BOB: ActorId = ActorId::new([0xb0; 20]);

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Delegates to an in-memory ledger, optionally parking `count()` until
    /// released.
    struct StallingGateway {
        inner: InMemoryLedger,
        stall: AtomicBool,
        stalled: AtomicBool,
        release: Notify,
    }

    impl StallingGateway {
        fn new() -> Self {
            Self {
                inner: InMemoryLedger::new(),
                stall: AtomicBool::new(false),
                stalled: AtomicBool::new(false),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl LedgerGateway for StallingGateway {
        async fn count(&self) -> Result<u64, GatewayError> {
            if self.stall.swap(false, Ordering::SeqCst) {
                self.stalled.store(true, Ordering::SeqCst);
                self.release.notified().await;
            }
            self.inner.count().await
        }

        async fn get(&self, index: RecordId) -> Result<RecordDto, GatewayError> {
            self.inner.get(index).await
        }

        async fn submit_create(
            &self,
            name: &str,
            cost: U256,
            from: &ActorId,
        ) -> Result<TransactionResult, GatewayError> {
            self.inner.submit_create(name, cost, from).await
        }

        async fn submit_pay(
            &self,
            index: RecordId,
            value: U256,
            from: &ActorId,
        ) -> Result<TransactionResult, GatewayError> {
            self.inner.submit_pay(index, value, from).await
        }

        async fn submit_deliver(
            &self,
            index: RecordId,
            from: &ActorId,
        ) -> Result<TransactionResult, GatewayError> {
            self.inner.submit_deliver(index, from).await
        }

        fn gateway_id(&self) -> &str {
            "stalling-gateway"
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..1_000 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("condition not reached");
    }

    // =============================================================================
    // TESTS
    // =============================================================================

    #[tokio::test]
    async fn test_sync_spanning_actor_change_refetches_for_new_actor() {
        let gateway = Arc::new(StallingGateway::new());
        gateway.inner.seed("Widget", U256::from(100), RecordState::Created);
        let sink = Arc::new(RecordingSink::new());
        let (actor_tx, actor_rx) = watch::channel(Some(ALICE));
        let config = SyncConfig {
            sync_interval_ms: 60_000,
            sync_on_start: false,
            ..SyncConfig::default()
        };
        let session = Arc::new(ClientSession::new(config, gateway.clone(), sink.clone(), actor_rx));
        session.start();

        gateway.stall.store(true, Ordering::SeqCst);
        let spanning = {
            let session = session.clone();
            tokio::spawn(async move { session.sync_now().await })
        };
        wait_until(|| gateway.stalled.load(Ordering::SeqCst)).await;

        actor_tx.send(Some(BOB)).unwrap();
        wait_until(|| session.epoch() == 1).await;
        // Let the restarted loop run its immediate sync into the held slot
        tokio::time::sleep(Duration::from_millis(20)).await;
        gateway.release.notify_one();

        assert_eq!(spanning.await.unwrap(), SyncOutcome::Completed { records: 1 });
        assert_eq!(session.sync_stats().discarded.load(Ordering::SeqCst), 1);
        assert!(sink.snapshots().iter().all(|s| s.epoch() == 1));

        // No manual sync: the new actor already owns the record
        let snapshot = session.snapshot();
        assert_eq!(snapshot.epoch(), 1);
        assert_eq!(snapshot.get(0).unwrap().owner, Some(BOB));
        assert!(session.pay(0).await.is_ok());
        assert_eq!(gateway.inner.state_of(0), Some(RecordState::Paid));
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_late_result_after_shutdown_not_published() {
        let gateway = Arc::new(StallingGateway::new());
        let sink = Arc::new(RecordingSink::new());
        let (_actor_tx, actor_rx) = watch::channel(Some(ALICE));
        let session = Arc::new(ClientSession::new(
            SyncConfig::for_testing(),
            gateway.clone(),
            sink.clone(),
            actor_rx,
        ));

        gateway.stall.store(true, Ordering::SeqCst);
        let late = {
            let session = session.clone();
            tokio::spawn(async move { session.sync_now().await })
        };
        wait_until(|| gateway.stalled.load(Ordering::SeqCst)).await;

        session.shutdown().await;
        gateway.release.notify_one();

        assert_eq!(late.await.unwrap(), SyncOutcome::Discarded);
        assert!(sink.snapshots().is_empty());
        assert!(sink.errors().is_empty());

        // A closed session submits nothing more
        assert!(session.create("Widget", U256::one()).await.is_err());
        assert_eq!(gateway.inner.calls().create, 0);
        assert!(sink.in_flight_updates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_sync_picks_up_remote_changes() {
        let ledger = Arc::new(InMemoryLedger::new());
        let (_actor_tx, actor_rx) = watch::channel(Some(ALICE));
        let session = ClientSession::new(
            SyncConfig::default(),
            ledger.clone(),
            Arc::new(RecordingSink::new()),
            actor_rx,
        );
        session.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(session.snapshot().is_empty());

        ledger.seed("Remote", U256::from(5), RecordState::Created);
        tokio::time::sleep(Duration::from_millis(2000)).await;

        assert_eq!(session.snapshot().len(), 1);
        session.shutdown().await;
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_actor_cleared_blocks_actions() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.seed("Widget", U256::from(100), RecordState::Created);
        let (actor_tx, actor_rx) = watch::channel(Some(ALICE));
        let session = ClientSession::new(
            SyncConfig::for_testing(),
            ledger.clone(),
            Arc::new(RecordingSink::new()),
            actor_rx,
        );
        session.sync_now().await;

        actor_tx.send(None).unwrap();

        assert!(session.pay(0).await.is_err());
        assert_eq!(ledger.calls().pay, 0);
    }
}
