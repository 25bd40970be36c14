//! # Domain Value Objects
//!
//! Immutable value types for ledger sync and dispatch: record lifecycle
//! states, actor identities, dispatch keys and gateway DTOs.

use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable index assigned to a record by the ledger at creation.
pub type RecordId = u64;

/// Ledger account of the local actor (20-byte address).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub [u8; 20]);

impl ActorId {
    /// Create an actor id from raw address bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Error parsing an [`ActorId`] from hex.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActorIdParseError {
    /// Input is not valid hex.
    #[error("Invalid hex in actor id: {0}")]
    InvalidHex(String),

    /// Input decodes to the wrong number of bytes.
    #[error("Actor id must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for ActorId {
    type Err = ActorIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes =
            hex::decode(digits).map_err(|e| ActorIdParseError::InvalidHex(e.to_string()))?;
        let array: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ActorIdParseError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

/// Lifecycle state of a record.
///
/// The ordinal is the value the ledger reports. States only advance
/// `Created -> Paid -> Delivered`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum RecordState {
    /// Created, awaiting payment.
    Created = 0,
    /// Paid, awaiting delivery.
    Paid = 1,
    /// Delivered. Terminal.
    Delivered = 2,
}

impl RecordState {
    /// Ordinal as reported by the ledger.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Decode a ledger ordinal.
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Created),
            1 => Some(Self::Paid),
            2 => Some(Self::Delivered),
            _ => None,
        }
    }

    /// The only state reachable from this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Paid),
            Self::Paid => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// No action is legal once a record reaches this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "Created",
            Self::Paid => "Paid",
            Self::Delivered => "Delivered",
        };
        f.write_str(label)
    }
}

/// Kind of action the dispatcher can submit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    /// Register a new record.
    Create,
    /// Pay for a created record.
    Pay,
    /// Mark a paid record as delivered.
    Deliver,
}

impl ActionKind {
    /// State a record must be in for this action to be legal.
    ///
    /// `Create` has no record yet, so no state requirement.
    pub fn required_state(self) -> Option<RecordState> {
        match self {
            Self::Create => None,
            Self::Pay => Some(RecordState::Created),
            Self::Deliver => Some(RecordState::Paid),
        }
    }

    /// Short lowercase label (used in logs and metric labels).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Pay => "pay",
            Self::Deliver => "deliver",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of an in-flight dispatch.
///
/// `Create` has no record id yet and gets a key of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DispatchKey {
    /// The single create slot.
    Create,
    /// Payment of a record.
    Pay(RecordId),
    /// Delivery of a record.
    Deliver(RecordId),
}

impl DispatchKey {
    /// Action this key guards.
    pub fn action(&self) -> ActionKind {
        match self {
            Self::Create => ActionKind::Create,
            Self::Pay(_) => ActionKind::Pay,
            Self::Deliver(_) => ActionKind::Deliver,
        }
    }

    /// Record this key refers to, if any.
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            Self::Create => None,
            Self::Pay(id) | Self::Deliver(id) => Some(*id),
        }
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Pay(id) => write!(f, "pay#{}", id),
            Self::Deliver(id) => write!(f, "deliver#{}", id),
        }
    }
}

/// A record as the ledger reports it, before local interpretation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDto {
    /// Name supplied at creation.
    pub name: String,
    /// Cost in the ledger's native unit.
    pub cost: U256,
    /// Raw state ordinal.
    pub state_ordinal: u8,
}

/// Receipt of a submitted transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Transaction hash.
    pub tx_hash: H256,
    /// Block the transaction was included in.
    pub block_number: u64,
}
