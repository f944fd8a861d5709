//! Auto-cancellation matching for CASH entries.
//!
//! Once cash is paid at a checkpoint, every other open LPO for the same
//! truck at that checkpoint is stale. All of them are cancelled; there is
//! no "most recent wins" tie-break.

use super::resolver::StationSnapshot;
use crate::models::{normalize_truck, Checkpoint, LpoEntry};

/// Open rows for `truck_no` sitting on `checkpoint`.
///
/// A row sits on the checkpoint when its station serves it in the snapshot,
/// or when the row itself was booked to the checkpoint's column.
pub fn find_cancellation_targets<'a>(
    truck_no: &str,
    checkpoint: &Checkpoint,
    candidates: &'a [LpoEntry],
    snapshot: &StationSnapshot,
) -> Vec<&'a LpoEntry> {
    let truck_key = normalize_truck(truck_no);
    let column = checkpoint.column();

    candidates
        .iter()
        .filter(|row| row.is_open())
        .filter(|row| normalize_truck(&row.truck_no) == truck_key)
        .filter(|row| snapshot.is_attached(&row.station, checkpoint) || row.column == Some(column))
        .collect()
}
