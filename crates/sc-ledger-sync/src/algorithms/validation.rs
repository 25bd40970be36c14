//! Action precondition checks.
//!
//! Pure functions over a snapshot and the current actor. The actor is always
//! passed in by the caller so a change of identity takes effect on the very
//! next call.

use crate::domain::{ActionKind, ActorId, Record, RecordId, Snapshot, ValidationError};

/// Check a `create` call and return the actor that will submit it.
///
/// Costs are `U256`, so the non-negative rule holds by construction and only
/// the name needs checking. `max_name_len` is measured in bytes.
pub fn validate_create(
    name: &str,
    max_name_len: usize,
    actor: Option<ActorId>,
) -> Result<ActorId, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.len() > max_name_len {
        return Err(ValidationError::NameTooLong {
            len: name.len(),
            max: max_name_len,
        });
    }
    actor.ok_or(ValidationError::NoActiveActor)
}

/// Check a `pay` call: record exists, is `Created`, and is owned by `actor`.
pub fn validate_pay<'a>(
    snapshot: &'a Snapshot,
    record_id: RecordId,
    actor: Option<&ActorId>,
) -> Result<&'a Record, ValidationError> {
    validate_record_action(snapshot, record_id, ActionKind::Pay, actor)
}

/// Check a `deliver` call: record exists, is `Paid`, and is owned by `actor`.
pub fn validate_deliver<'a>(
    snapshot: &'a Snapshot,
    record_id: RecordId,
    actor: Option<&ActorId>,
) -> Result<&'a Record, ValidationError> {
    validate_record_action(snapshot, record_id, ActionKind::Deliver, actor)
}

fn validate_record_action<'a>(
    snapshot: &'a Snapshot,
    record_id: RecordId,
    action: ActionKind,
    actor: Option<&ActorId>,
) -> Result<&'a Record, ValidationError> {
    let record = snapshot
        .get(record_id)
        .ok_or(ValidationError::RecordNotFound(record_id))?;

    if let Some(expected) = action.required_state() {
        if record.state != expected {
            return Err(ValidationError::InvalidState {
                id: record_id,
                action,
                expected,
                actual: record.state,
            });
        }
    }

    let actor = actor.ok_or(ValidationError::NoActiveActor)?;
    if !record.is_owned_by(actor) {
        return Err(ValidationError::NotOwner(record_id));
    }

    Ok(record)
}
