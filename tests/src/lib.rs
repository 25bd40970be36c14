//! # Supply-Chain Client Test Suite
//!
//! Cross-crate tests driving a full [`sc_ledger_sync::ClientSession`] against
//! the in-memory ledger or a custom gateway.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs        # create / pay / deliver round trips, failures
//!     ├── lifecycle.rs    # actor switching, stale results, shutdown
//!     └── properties.rs   # random action sequences against the ledger
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sc-tests
//! cargo test -p sc-tests integration::lifecycle
//! ```

pub mod integration;
