//! # Application Layer
//!
//! Snapshot cache, dispatch tracker, sync loop and action dispatcher, tied
//! together by [`ClientSession`].

pub mod cache;
pub mod context;
pub mod dispatcher;
pub mod session;
pub mod sync_loop;
pub mod tracker;

pub use cache::SnapshotCache;
pub use context::SessionContext;
pub use dispatcher::{ActionDispatcher, DispatchStats};
pub use session::ClientSession;
pub use sync_loop::{SyncLoop, SyncOutcome, SyncStats};
pub use tracker::{DispatchGuard, DispatchTracker};
