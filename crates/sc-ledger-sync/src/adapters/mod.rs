//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound ports: a process-local ledger and the
//! presentation sinks used by the client runtime.

mod channel_sink;
mod in_memory_ledger;
mod tracing_sink;

pub use channel_sink::{ChannelSink, FanoutSink, ViewEvent, DEFAULT_VIEW_CAPACITY};
pub use in_memory_ledger::{FaultPlan, InMemoryLedger, LedgerCalls};
pub use tracing_sink::TracingSink;
