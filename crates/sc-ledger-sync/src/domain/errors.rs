//! # Domain Errors
//!
//! Error taxonomy of the sync and dispatch engine.
//!
//! | Error | Raised by | Gateway contacted | In-flight flag |
//! |-------|-----------|-------------------|----------------|
//! | [`ValidationError`] | dispatcher preconditions | no | never set |
//! | [`DispatchError::AlreadyInFlight`] | dispatch tracker | no | untouched |
//! | [`GatewayError`] | ledger transport / rejection | yes | cleared |
//! | [`SyncError`] | sync loop fetch | yes | n/a |
//!
//! Every error is terminal at the engine boundary: it is returned to the
//! caller and reported to the presentation sink. Nothing is retried.

use super::value_objects::{ActionKind, DispatchKey, RecordId, RecordState};
use thiserror::Error;

/// A precondition of an action failed. Never reaches the gateway.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// `create` was called with an empty name.
    #[error("Record name must not be empty")]
    EmptyName,

    /// `create` was called with an oversized name.
    #[error("Record name too long: {len} > {max}")]
    NameTooLong {
        /// Length supplied
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// The record is not part of the current snapshot.
    #[error("Record {0} not found in current snapshot")]
    RecordNotFound(RecordId),

    /// The record is not in the state the action requires.
    #[error("Cannot {action} record {id}: state is {actual}, expected {expected}")]
    InvalidState {
        /// Record id
        id: RecordId,
        /// Action attempted
        action: ActionKind,
        /// Required state
        expected: RecordState,
        /// State in the current snapshot
        actual: RecordState,
    },

    /// The current actor has no rights over the record.
    #[error("Record {0} is not owned by the current actor")]
    NotOwner(RecordId),

    /// No actor is available to sign the submission.
    #[error("No active actor")]
    NoActiveActor,

    /// The session has ended; nothing more is submitted.
    #[error("Session closed")]
    SessionClosed,
}

/// Transport failure or remote rejection from the ledger gateway.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway could not be reached.
    #[error("Ledger unreachable: {0}")]
    Transport(String),

    /// The ledger rejected the call.
    #[error("Rejected by ledger: {0}")]
    Rejected(String),

    /// The ledger answered with something that could not be decoded.
    #[error("Malformed ledger response: {0}")]
    Malformed(String),
}

/// A sync round failed. The previous snapshot stays in place.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Fetching the record count failed.
    #[error("Failed to fetch record count: {0}")]
    Count(#[source] GatewayError),

    /// Fetching a single record failed.
    #[error("Failed to fetch record {index}: {source}")]
    Record {
        /// Index being fetched
        index: RecordId,
        /// Underlying gateway failure
        source: GatewayError,
    },

    /// The ledger reported a state ordinal outside the lifecycle.
    #[error("Record {index} has unknown state ordinal {ordinal}")]
    UnknownState {
        /// Index of the record
        index: RecordId,
        /// Ordinal received
        ordinal: u8,
    },
}

/// Failure of a create / pay / deliver call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Precondition failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The same action on the same record is still outstanding.
    #[error("Action already in flight: {0}")]
    AlreadyInFlight(DispatchKey),

    /// The gateway call failed.
    #[error("Ledger call for {action} failed: {source}")]
    Gateway {
        /// Action being submitted
        action: ActionKind,
        /// Underlying gateway failure
        source: GatewayError,
    },
}

impl DispatchError {
    /// Whether the call was turned down before reaching the gateway.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::AlreadyInFlight(_))
    }
}

/// Any error surfaced to the presentation sink.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Action dispatch failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Sync round failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        Self::Dispatch(DispatchError::Validation(err))
    }
}
