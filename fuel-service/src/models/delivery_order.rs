use super::checkpoint::Direction;
use super::normalize_truck;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DoType {
    Do,
    Sdo,
}

/// Cargo flow. Imports run inland from the port (going leg); exports come
/// back towards the coast (returning leg).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportExport {
    Import,
    Export,
}

impl ImportExport {
    pub fn direction(&self) -> Direction {
        match self {
            Self::Import => Direction::Going,
            Self::Export => Direction::Returning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOrder {
    #[serde(rename = "_id")]
    pub id: String,
    pub do_no: String,
    pub do_type: DoType,
    pub import_export: ImportExport,
    pub date: NaiveDate,
    pub truck_no: String,
    pub truck_key: String,
    #[serde(default)]
    pub trailer_no: Option<String>,
    #[serde(default)]
    pub driver_name: Option<String>,
    pub client_name: String,
    pub loading_point: String,
    pub destination: String,
    #[serde(default)]
    pub cargo: Option<String>,
    #[serde(default)]
    pub tonnage: Option<Decimal>,
    #[serde(default)]
    pub rate_per_ton: Option<Decimal>,
    /// Fuel record this DO opened or was attached to.
    #[serde(default)]
    pub fuel_record_id: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_by: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl DeliveryOrder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        do_no: &str,
        do_type: DoType,
        import_export: ImportExport,
        date: NaiveDate,
        truck_no: &str,
        client_name: &str,
        loading_point: &str,
        destination: &str,
        created_by: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            do_no: do_no.trim().to_uppercase(),
            do_type,
            import_export,
            date,
            truck_no: truck_no.trim().to_string(),
            truck_key: normalize_truck(truck_no),
            trailer_no: None,
            driver_name: None,
            client_name: client_name.trim().to_string(),
            loading_point: loading_point.trim().to_string(),
            destination: destination.trim().to_string(),
            cargo: None,
            tonnage: None,
            rate_per_ton: None,
            fuel_record_id: None,
            is_deleted: false,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.import_export.direction()
    }

    /// Freight value when both tonnage and rate are known.
    pub fn freight_amount(&self) -> Option<Decimal> {
        Some(self.tonnage? * self.rate_per_ton?)
    }
}
