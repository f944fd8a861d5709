pub mod checkpoint;
pub mod delivery_order;
pub mod driver_account;
pub mod fuel_record;
pub mod lpo;
pub mod station;

pub use checkpoint::{
    CancellationPoint, Checkpoint, CheckpointSelection, ColumnKind, CustomStationSelection,
    Direction, FixedCheckpoint, LedgerColumn, PaymentMode,
};
pub use delivery_order::{DeliveryOrder, DoType, ImportExport};
pub use driver_account::{DriverAccountEntry, DriverAccountExportRow, DriverAccountStatus};
pub use fuel_record::FuelRecord;
pub use lpo::{LpoEntry, LpoExportRow, LpoStatus};
pub use station::{station_key, StationConfig};

/// Placeholder rendered wherever a driver-account row would show a DO or
/// destination.
pub const NIL: &str = "NIL";

/// Canonical truck identifier: uppercase with all whitespace removed, so
/// `T530 DRF` and `t530drf` are the same truck.
pub fn normalize_truck(truck_no: &str) -> String {
    truck_no
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Documents guarded by an optimistic version counter. Stores only accept
/// an update whose `version` still equals the stored one.
pub trait Versioned {
    fn id(&self) -> &str;
    fn version(&self) -> i64;
    fn bump_version(&mut self);
}

macro_rules! impl_versioned {
    ($($ty:ty),*) => {
        $(impl Versioned for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn version(&self) -> i64 {
                self.version
            }

            fn bump_version(&mut self) {
                self.version += 1;
            }
        })*
    };
}

impl_versioned!(FuelRecord, LpoEntry, DriverAccountEntry);

// Helper module for optional DateTime<Utc> as BSON DateTime
pub(crate) mod opt_chrono_datetime_as_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(dt) => {
                let bson_dt = bson::DateTime::from_chrono(*dt);
                bson_dt.serialize(serializer)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        Ok(opt.map(|dt| dt.to_chrono()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_truck_ignores_case_and_spaces() {
        assert_eq!(normalize_truck("T530 DRF"), "T530DRF");
        assert_eq!(normalize_truck("  t530drf "), "T530DRF");
        assert_eq!(normalize_truck("t 530\tdrf"), "T530DRF");
    }
}
