pub mod delivery_orders;
pub mod driver_accounts;
pub mod fuel_records;
pub mod lpos;
pub mod reports;
pub mod stations;

pub use delivery_orders::*;
pub use driver_accounts::*;
pub use fuel_records::*;
pub use lpos::*;
pub use reports::*;
pub use stations::*;

use crate::models::normalize_truck;

/// Blank query values count as absent; trucks are matched on their
/// normalized key.
pub(crate) fn truck_param(truck_no: &Option<String>) -> Option<String> {
    truck_no
        .as_deref()
        .map(normalize_truck)
        .filter(|t| !t.is_empty())
}
