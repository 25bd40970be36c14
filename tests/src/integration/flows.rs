//! # Action Flows
//!
//! Create / pay / deliver round trips through a [`ClientSession`]:
//!
//! 1. **Validate** against the last snapshot and the current actor
//! 2. **Submit** through the gateway while the key is marked in flight
//! 3. **Re-sync** once, whatever the outcome
//!
//! The session is never started here; syncs happen on demand only, which
//! keeps gateway call counts exact.

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use primitive_types::U256;
    use sc_ledger_sync::{
        ActionKind, ActorId, ClientError, ClientSession, DispatchError, GatewayError,
        InMemoryLedger, RecordState, RecordingSink, SyncConfig, SyncError, SyncOutcome,
        ValidationError,
    };
    use tokio::sync::watch;

    const ALICE: ActorId = ActorId::new([0xa1; 20]);

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Harness {
        session: ClientSession,
        ledger: Arc<InMemoryLedger>,
        sink: Arc<RecordingSink>,
        _actor: watch::Sender<Option<ActorId>>,
    }

    fn harness() -> Harness {
        let ledger = Arc::new(InMemoryLedger::new());
        let sink = Arc::new(RecordingSink::new());
        let (actor_tx, actor_rx) = watch::channel(Some(ALICE));
        let session = ClientSession::new(
            SyncConfig::for_testing(),
            ledger.clone(),
            sink.clone(),
            actor_rx,
        );
        Harness {
            session,
            ledger,
            sink,
            _actor: actor_tx,
        }
    }

    // =============================================================================
    // LEDGER SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_create_on_empty_ledger() {
        let h = harness();
        assert_eq!(h.session.sync_now().await, SyncOutcome::Completed { records: 0 });

        h.session.create("Widget", U256::from(100)).await.unwrap();

        let snapshot = h.session.snapshot();
        assert_eq!(snapshot.len(), 1);
        let record = snapshot.get(0).unwrap();
        assert_eq!(record.id, 0);
        assert_eq!(record.name, "Widget");
        assert_eq!(record.cost, U256::from(100));
        assert_eq!(record.state, RecordState::Created);
        assert_eq!(record.to_string(), "Widget - Cost: 100 - Status: Created");
    }

    #[tokio::test]
    async fn test_pay_advances_only_after_resync() {
        let h = harness();
        h.ledger.seed("Widget", U256::from(100), RecordState::Created);
        h.session.sync_now().await;

        h.session.pay(0).await.unwrap();

        assert_eq!(h.session.snapshot().get(0).unwrap().state, RecordState::Paid);
        // Initial sync plus the one triggered by the payment
        assert_eq!(h.ledger.calls().count, 2);
        assert_eq!(h.sink.snapshots().len(), 2);
    }

    #[tokio::test]
    async fn test_pay_on_paid_record_never_reaches_gateway() {
        let h = harness();
        h.ledger.seed("Widget", U256::from(100), RecordState::Paid);
        h.session.sync_now().await;
        let calls_before = h.ledger.calls();

        let err = h.session.pay(0).await.unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Validation(ValidationError::InvalidState {
                id: 0,
                action: ActionKind::Pay,
                ..
            })
        ));
        assert_eq!(h.ledger.calls(), calls_before);
        assert!(h.sink.in_flight_updates().is_empty());
        assert_eq!(h.sink.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_record_read_keeps_snapshot() {
        let h = harness();
        for name in ["A", "B", "C"] {
            h.ledger.seed(name, U256::one(), RecordState::Created);
        }
        h.session.sync_now().await;
        let before = h.session.snapshot();

        h.ledger.faults().fail_get_at = Some(1);
        let outcome = h.session.sync_now().await;

        assert!(matches!(
            outcome,
            SyncOutcome::Failed(SyncError::Record { index: 1, .. })
        ));
        assert_eq!(h.session.snapshot().len(), 3);
        assert_eq!(*h.session.snapshot(), *before);
        assert!(matches!(
            h.sink.errors().last(),
            Some(ClientError::Sync(SyncError::Record { index: 1, .. }))
        ));
    }

    #[tokio::test]
    async fn test_gateway_rejection_still_resyncs() {
        let h = harness();
        h.ledger.seed("Widget", U256::from(100), RecordState::Created);
        h.session.sync_now().await;

        // The ledger moves on behind the client's back
        h.ledger.force_state(0, RecordState::Paid);
        let err = h.session.pay(0).await.unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Gateway {
                action: ActionKind::Pay,
                source: GatewayError::Rejected(_),
            }
        ));
        assert!(h.session.in_flight().is_empty());
        // The re-sync makes the remote change visible
        assert_eq!(h.session.snapshot().get(0).unwrap().state, RecordState::Paid);
    }

    #[tokio::test]
    async fn test_one_sync_per_submission() {
        let h = harness();
        h.session.create("A", U256::from(1)).await.unwrap();
        h.session.create("B", U256::from(2)).await.unwrap();
        h.session.pay(1).await.unwrap();
        h.ledger.faults().fail_submits = true;
        assert!(h.session.deliver(1).await.is_err());

        assert_eq!(h.ledger.calls().count, 4);
        assert_eq!(h.session.dispatch_stats().submitted.load(Ordering::Relaxed), 4);
    }

    // =============================================================================
    // RUNTIME FRONT-END
    // =============================================================================

    #[tokio::test]
    async fn test_runtime_command_round_trip() {
        use client_runtime::{parse_command, ClientConfig, ClientRuntime, Reply};

        let runtime = ClientRuntime::new(&ClientConfig {
            sync: SyncConfig::for_testing(),
            actor: Some(ALICE),
            ..ClientConfig::default()
        });

        for line in ["create Crate 42", "pay 0", "deliver 0"] {
            let command = parse_command(line).unwrap().unwrap();
            let Reply::Text(text) = runtime.execute(command).await else {
                panic!("unexpected quit");
            };
            assert!(text.contains("confirmed"), "{}: {}", line, text);
        }

        let snapshot = runtime.session().snapshot();
        assert_eq!(snapshot.get(0).unwrap().state, RecordState::Delivered);
        runtime.shutdown().await;
    }
}
