//! # Lifecycle Properties
//!
//! Random action sequences against a session backed by the in-memory
//! ledger. After every action the snapshot must match the ledger, states
//! must never move backwards and rejected actions must never reach it.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use primitive_types::U256;
    use proptest::prelude::*;
    use sc_ledger_sync::{
        ActorId, ClientSession, DispatchError, InMemoryLedger, RecordId, RecordingSink, SyncConfig,
    };
    use tokio::sync::watch;

    const ALICE: ActorId = ActorId::new([0xa1; 20]);

    #[derive(Clone, Debug)]
    enum Action {
        Create(u64),
        Pay(RecordId),
        Deliver(RecordId),
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (1u64..1_000).prop_map(Action::Create),
            (0u64..6).prop_map(Action::Pay),
            (0u64..6).prop_map(Action::Deliver),
        ]
    }

    async fn run_sequence(actions: Vec<Action>) -> Result<(), TestCaseError> {
        let ledger = Arc::new(InMemoryLedger::new());
        let (_actor_tx, actor_rx) = watch::channel(Some(ALICE));
        let session = ClientSession::new(
            SyncConfig::for_testing(),
            ledger.clone(),
            Arc::new(RecordingSink::new()),
            actor_rx,
        );
        session.sync_now().await;

        for action in actions {
            let before = session.snapshot();
            let submits_before = ledger.calls();

            let result = match action {
                Action::Create(cost) => session.create("Item", U256::from(cost)).await,
                Action::Pay(id) => session.pay(id).await,
                Action::Deliver(id) => session.deliver(id).await,
            };

            if let Err(DispatchError::Validation(_)) = result {
                let calls = ledger.calls();
                prop_assert_eq!(calls.create, submits_before.create);
                prop_assert_eq!(calls.pay, submits_before.pay);
                prop_assert_eq!(calls.deliver, submits_before.deliver);
            } else {
                prop_assert!(result.is_ok(), "unexpected failure: {:?}", result);
            }

            let after = session.snapshot();
            prop_assert_eq!(after.len(), ledger.len());
            for record in after.iter() {
                prop_assert_eq!(Some(record.state), ledger.state_of(record.id));
                if let Some(previous) = before.get(record.id) {
                    prop_assert!(previous.state <= record.state);
                }
            }
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_snapshot_tracks_ledger(actions in prop::collection::vec(action(), 1..24)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(run_sequence(actions))?;
        }
    }
}
