//! Full record-set fetch.
//!
//! Reads `count()` and then every record in index order. The result is all
//! or nothing: any failure aborts the fetch and no partial snapshot escapes.

use crate::domain::{invariant_dense_ids, ActorId, Record, RecordId, Snapshot, SyncError};
use crate::ports::LedgerGateway;

/// Fetch the complete record set from `gateway`.
///
/// Every record is attributed to `owner`, the actor of the session the
/// fetch runs under.
///
/// # Errors
/// - `Count` if the record count cannot be read
/// - `Record` if any single record cannot be read
/// - `UnknownState` if the ledger reports an unknown state ordinal
pub async fn fetch_snapshot<G>(
    gateway: &G,
    owner: Option<ActorId>,
    epoch: u64,
) -> Result<Snapshot, SyncError>
where
    G: LedgerGateway + ?Sized,
{
    let count = gateway.count().await.map_err(SyncError::Count)?;

    let mut records = Vec::with_capacity(usize::try_from(count).unwrap_or(0).min(4096));
    for index in 0..count {
        records.push(fetch_record(gateway, index, owner).await?);
    }

    let snapshot = Snapshot::new(records, epoch);
    debug_assert!(invariant_dense_ids(&snapshot));
    Ok(snapshot)
}

async fn fetch_record<G>(
    gateway: &G,
    index: RecordId,
    owner: Option<ActorId>,
) -> Result<Record, SyncError>
where
    G: LedgerGateway + ?Sized,
{
    let dto = gateway
        .get(index)
        .await
        .map_err(|source| SyncError::Record { index, source })?;
    Record::from_dto(index, dto, owner)
}
