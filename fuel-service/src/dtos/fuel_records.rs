use super::truck_param;
use crate::domain::ExtraFuelFlag;
use crate::models::{FuelRecord, LedgerColumn};
use crate::services::{ColumnUpdate, NewFuelRecord, RecordFilter};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFuelRecordRequest {
    #[validate(length(min = 1, message = "Truck number is required"))]
    pub truck_no: String,
    #[validate(length(min = 1, message = "Going DO is required"))]
    pub going_do: String,
    #[validate(length(min = 1, message = "Route origin is required"))]
    pub route_from: String,
    #[validate(length(min = 1, message = "Route destination is required"))]
    pub route_to: String,
    pub date: NaiveDate,
    /// Yard allocations in litres, keyed by yard column.
    #[serde(default)]
    pub yard: BTreeMap<LedgerColumn, Decimal>,
    pub extra: Option<Decimal>,
}

impl From<CreateFuelRecordRequest> for NewFuelRecord {
    fn from(req: CreateFuelRecordRequest) -> Self {
        Self {
            truck_no: req.truck_no,
            going_do: req.going_do,
            route_from: req.route_from,
            route_to: req.route_to,
            date: req.date,
            yard: req.yard,
            extra: req.extra,
        }
    }
}

/// Column values as stored: yards positive, checkpoints negative.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateColumnsRequest {
    pub expected_version: Option<i64>,
    #[serde(default)]
    pub columns: BTreeMap<LedgerColumn, Decimal>,
    pub extra: Option<Decimal>,
}

impl From<UpdateColumnsRequest> for ColumnUpdate {
    fn from(req: UpdateColumnsRequest) -> Self {
        Self {
            expected_version: req.expected_version,
            columns: req.columns,
            extra: req.extra,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordListParams {
    pub truck_no: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_deleted: Option<bool>,
}

impl From<&RecordListParams> for RecordFilter {
    fn from(params: &RecordListParams) -> Self {
        Self {
            truck_key: truck_param(&params.truck_no),
            from: params.from,
            to: params.to,
            include_deleted: params.include_deleted.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FuelRecordResponse {
    pub id: String,
    pub truck_no: String,
    pub going_do: String,
    pub return_do: Option<String>,
    pub route_from: String,
    pub route_to: String,
    pub date: NaiveDate,
    pub columns: BTreeMap<LedgerColumn, Decimal>,
    pub extra: Decimal,
    pub total_lts: Decimal,
    pub balance: Decimal,
    pub version: i64,
    pub is_deleted: bool,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FuelRecord> for FuelRecordResponse {
    fn from(record: FuelRecord) -> Self {
        Self {
            columns: LedgerColumn::ALL
                .iter()
                .map(|c| (*c, record.column(*c)))
                .collect(),
            id: record.id,
            truck_no: record.truck_no,
            going_do: record.going_do,
            return_do: record.return_do,
            route_from: record.route_from,
            route_to: record.route_to,
            date: record.date,
            extra: record.extra,
            total_lts: record.total_lts,
            balance: record.balance,
            version: record.version,
            is_deleted: record.is_deleted,
            created_by: record.created_by,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExtraFuelResponse {
    pub fuel_record_id: String,
    pub flags: Vec<ExtraFuelFlag>,
    pub total_delta: Decimal,
}

impl ExtraFuelResponse {
    pub fn new(fuel_record_id: String, flags: Vec<ExtraFuelFlag>) -> Self {
        let total_delta = flags.iter().map(|f| f.delta).sum();
        Self {
            fuel_record_id,
            flags,
            total_delta,
        }
    }
}
