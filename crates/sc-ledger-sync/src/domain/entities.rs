//! # Domain Entities
//!
//! The tracked record and the snapshot that holds the full record set.

use super::errors::SyncError;
use super::value_objects::{ActorId, RecordDto, RecordId, RecordState};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One tracked supply-chain item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Index assigned by the ledger.
    pub id: RecordId,
    /// Name supplied at creation.
    pub name: String,
    /// Cost in the ledger's native unit.
    pub cost: U256,
    /// Lifecycle state as last reported by the ledger.
    pub state: RecordState,
    /// Actor holding rights over the record in this session.
    pub owner: Option<ActorId>,
}

impl Record {
    /// Create a new record.
    pub fn new(
        id: RecordId,
        name: impl Into<String>,
        cost: U256,
        state: RecordState,
        owner: Option<ActorId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            cost,
            state,
            owner,
        }
    }

    /// Interpret a ledger DTO fetched at `index`.
    ///
    /// # Errors
    /// - `UnknownState` if the ordinal is outside the lifecycle
    pub fn from_dto(
        index: RecordId,
        dto: RecordDto,
        owner: Option<ActorId>,
    ) -> Result<Self, SyncError> {
        let state = RecordState::from_ordinal(dto.state_ordinal).ok_or(SyncError::UnknownState {
            index,
            ordinal: dto.state_ordinal,
        })?;
        Ok(Self::new(index, dto.name, dto.cost, state, owner))
    }

    /// Whether `actor` has rights over this record.
    pub fn is_owned_by(&self, actor: &ActorId) -> bool {
        self.owner.as_ref() == Some(actor)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - Cost: {} - Status: {}",
            self.name, self.cost, self.state
        )
    }
}

/// Full ordered copy of the ledger's records at one point in time.
///
/// Record `i` always has id `i`. A snapshot is never patched; every sync
/// builds a new one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Records in index order.
    records: Vec<Record>,
    /// Session epoch the snapshot was fetched under.
    epoch: u64,
}

impl Snapshot {
    /// Build a snapshot from records in index order.
    pub fn new(records: Vec<Record>, epoch: u64) -> Self {
        Self { records, epoch }
    }

    /// Snapshot with no records (before the first sync).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a record by id.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.records.get(index))
    }

    /// All records in index order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterate records in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Session epoch the snapshot belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
