//! # Supply-Chain Ledger Sync
//!
//! Client core for a supply-chain ledger: keeps a local, read-only mirror of
//! the ledger's records and dispatches the three state-changing actions
//! against it.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Record Lifecycle
//!
//! ```text
//! Created ──pay──→ Paid ──deliver──→ Delivered
//! ```
//!
//! No transition skips a state and nothing leaves `Delivered`. Local state is
//! never advanced optimistically: every action is followed by a re-sync and
//! the snapshot only changes when the ledger says so.
//!
//! ## Guarantees
//!
//! | Concern | Rule |
//! |---------|------|
//! | Snapshot cache | Replaced wholesale, single writer (the sync loop) |
//! | Sync loop | One sync at a time, extra triggers coalesced |
//! | Dispatch | One in-flight submission per (action, record) |
//! | Errors | Reported to caller and sink, never retried |
//! | Actor change | In-progress fetch repeated for the new actor |
//! | Session end | Timer released, late results discarded, dispatch refused |
//!
//! ## Module Structure
//!
//! ```text
//! sc-ledger-sync/
//! ├── domain/          # Record, Snapshot, ids, errors, invariants
//! ├── algorithms/      # Action validation, full-snapshot fetch
//! ├── ports/           # SupplyChainApi (inbound), gateway + sink (outbound)
//! ├── application/     # Cache, tracker, sync loop, dispatcher, session
//! ├── adapters/        # In-memory ledger, tracing / channel sinks
//! └── config.rs        # SyncConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{
    ChannelSink, FanoutSink, FaultPlan, InMemoryLedger, LedgerCalls, TracingSink, ViewEvent,
};
pub use algorithms::{fetch_snapshot, validate_create, validate_deliver, validate_pay};
pub use application::{
    ActionDispatcher, ClientSession, DispatchStats, DispatchTracker, SnapshotCache, SyncLoop,
    SyncOutcome, SyncStats,
};
pub use config::SyncConfig;
pub use domain::{
    ActionKind, ActorId, ActorIdParseError, ClientError, DispatchError, DispatchKey,
    GatewayError, Record, RecordDto, RecordId, RecordState, Snapshot, SyncError,
    TransactionResult, ValidationError, DEFAULT_MAX_NAME_LEN, DEFAULT_SYNC_INTERVAL_MS,
};
pub use ports::{LedgerGateway, PresentationSink, RecordingSink, SupplyChainApi};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
