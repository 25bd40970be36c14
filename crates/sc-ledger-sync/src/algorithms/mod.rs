//! # Algorithms Module
//!
//! Pure logic for action validation and full-snapshot fetching.

pub mod snapshot_fetch;
pub mod validation;

pub use snapshot_fetch::fetch_snapshot;
pub use validation::{validate_create, validate_deliver, validate_pay};
