//! Driver-account settlement and its opt-in ledger booking.
//!
//! Driver-account fuel only reaches a fuel record when an operator names a
//! checkpoint for it. It never goes through auto-cancellation.

use super::error::{FuelError, FuelResult};
use crate::models::{Checkpoint, DriverAccountEntry, FuelRecord};
use chrono::{DateTime, Utc};

/// Documents changed by a driver-account command.
#[derive(Debug, Clone)]
pub struct SettlementPlan {
    pub entry: DriverAccountEntry,
    pub record: Option<FuelRecord>,
}

/// Book an entry's litres on `record` at the checkpoint's column.
pub fn apply_driver_account_to_ledger(
    mut entry: DriverAccountEntry,
    checkpoint: Checkpoint,
    mut record: FuelRecord,
) -> FuelResult<SettlementPlan> {
    if entry.booking().is_some() {
        return Err(FuelError::Conflict(format!(
            "Driver account entry {} is already booked on fuel record {}",
            entry.id,
            entry.fuel_record_id.as_deref().unwrap_or_default()
        )));
    }
    if record.is_deleted {
        return Err(FuelError::NotFound(format!(
            "Fuel record not found: {}",
            record.id
        )));
    }
    if record.truck_key != entry.truck_key {
        return Err(FuelError::validation(
            "reference_do",
            format!(
                "fuel record {} belongs to truck {}, not {}",
                record.id, record.truck_no, entry.truck_no
            ),
        ));
    }

    let column = checkpoint.column();
    record.apply_litres(column, entry.litres);
    entry.ledger_column = Some(column);
    entry.checkpoint = Some(checkpoint);
    entry.fuel_record_id = Some(record.id.clone());
    entry.updated_at = record.updated_at;

    Ok(SettlementPlan {
        entry,
        record: Some(record),
    })
}

/// `pending -> settled`, optionally booking the litres at the same time.
pub fn settle(
    mut entry: DriverAccountEntry,
    settled_by: &str,
    checkpoint: Option<Checkpoint>,
    record: Option<FuelRecord>,
    now: DateTime<Utc>,
) -> FuelResult<SettlementPlan> {
    entry.settle(settled_by, now)?;

    match (checkpoint, record) {
        (Some(checkpoint), Some(record)) => {
            apply_driver_account_to_ledger(entry, checkpoint, record)
        }
        (Some(_), None) => Err(FuelError::NotFound(format!(
            "No active fuel record for truck {}",
            entry.truck_no
        ))),
        (None, _) => Ok(SettlementPlan {
            entry,
            record: None,
        }),
    }
}

/// Take an entry's booking back off its record. Returns whether anything
/// was reverted.
pub fn release_booking(entry: &DriverAccountEntry, record: &mut FuelRecord) -> bool {
    match entry.booking() {
        Some((record_id, column, litres)) if record_id == record.id => {
            record.revert_litres(column, litres);
            true
        }
        _ => false,
    }
}

/// Move a booked entry's litres from `previous_litres` to its current
/// litres after an edit.
pub fn rebook(entry: &DriverAccountEntry, previous_litres: rust_decimal::Decimal, record: &mut FuelRecord) {
    if let Some((record_id, column, litres)) = entry.booking() {
        if record_id == record.id && litres != previous_litres {
            record.revert_litres(column, previous_litres);
            record.apply_litres(column, litres);
        }
    }
}
