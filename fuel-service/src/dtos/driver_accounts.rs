use super::{truck_param, FuelRecordResponse};
use crate::domain::SettlementPlan;
use crate::models::{
    CancellationPoint, Checkpoint, DriverAccountEntry, DriverAccountStatus, LedgerColumn,
};
use crate::services::{DriverAccountFilter, DriverAccountUpdate, NewDriverAccount};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverAccountRequest {
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "Truck number is required"))]
    pub truck_no: String,
    pub driver_name: Option<String>,
    #[validate(length(min = 1, message = "LPO number is required"))]
    pub lpo_no: String,
    #[validate(length(min = 1, message = "Station is required"))]
    pub station: String,
    pub litres: Decimal,
    pub rate: Decimal,
    pub cancellation_point: Option<CancellationPoint>,
    pub reference_do: Option<String>,
    pub notes: Option<String>,
}

impl From<CreateDriverAccountRequest> for NewDriverAccount {
    fn from(req: CreateDriverAccountRequest) -> Self {
        Self {
            date: req.date,
            truck_no: req.truck_no,
            driver_name: req.driver_name,
            lpo_no: req.lpo_no,
            station: req.station,
            litres: req.litres,
            rate: req.rate,
            cancellation_point: req.cancellation_point,
            reference_do: req.reference_do,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateDriverAccountRequest {
    pub date: Option<NaiveDate>,
    pub driver_name: Option<String>,
    #[validate(length(min = 1, message = "Station cannot be blank"))]
    pub station: Option<String>,
    pub litres: Option<Decimal>,
    pub rate: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl From<UpdateDriverAccountRequest> for DriverAccountUpdate {
    fn from(req: UpdateDriverAccountRequest) -> Self {
        Self {
            date: req.date,
            driver_name: req.driver_name,
            station: req.station,
            litres: req.litres,
            rate: req.rate,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SettleDriverAccountRequest {
    pub cancellation_point: Option<CancellationPoint>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct DisputeDriverAccountRequest {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct DriverAccountListParams {
    pub truck_no: Option<String>,
    pub status: Option<DriverAccountStatus>,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub include_deleted: Option<bool>,
}

impl From<&DriverAccountListParams> for DriverAccountFilter {
    fn from(params: &DriverAccountListParams) -> Self {
        Self {
            truck_key: truck_param(&params.truck_no),
            status: params.status,
            month: params.month,
            year: params.year,
            include_deleted: params.include_deleted.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DriverAccountResponse {
    pub id: String,
    pub date: NaiveDate,
    pub month: u32,
    pub year: i32,
    pub truck_no: String,
    pub driver_name: Option<String>,
    pub lpo_no: String,
    pub station: String,
    pub litres: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub cancellation_point: Option<CancellationPoint>,
    pub checkpoint: Option<Checkpoint>,
    pub reference_do: Option<String>,
    pub fuel_record_id: Option<String>,
    pub ledger_column: Option<LedgerColumn>,
    pub lpo_id: Option<String>,
    pub status: DriverAccountStatus,
    pub settled_at: Option<String>,
    pub settled_by: Option<String>,
    pub dispute_reason: Option<String>,
    pub notes: Option<String>,
    pub version: i64,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DriverAccountEntry> for DriverAccountResponse {
    fn from(entry: DriverAccountEntry) -> Self {
        Self {
            id: entry.id,
            date: entry.date,
            month: entry.month,
            year: entry.year,
            truck_no: entry.truck_no,
            driver_name: entry.driver_name,
            lpo_no: entry.lpo_no,
            station: entry.station,
            litres: entry.litres,
            rate: entry.rate,
            amount: entry.amount,
            cancellation_point: entry.cancellation_point,
            checkpoint: entry.checkpoint,
            reference_do: entry.reference_do,
            fuel_record_id: entry.fuel_record_id,
            ledger_column: entry.ledger_column,
            lpo_id: entry.lpo_id,
            status: entry.status,
            settled_at: entry.settled_at.map(|t| t.to_rfc3339()),
            settled_by: entry.settled_by,
            dispute_reason: entry.dispute_reason,
            notes: entry.notes,
            version: entry.version,
            created_by: entry.created_by,
            created_at: entry.created_at.to_rfc3339(),
            updated_at: entry.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DriverAccountOutcomeResponse {
    pub driver_account: DriverAccountResponse,
    pub fuel_record: Option<FuelRecordResponse>,
}

impl From<SettlementPlan> for DriverAccountOutcomeResponse {
    fn from(plan: SettlementPlan) -> Self {
        Self {
            driver_account: plan.entry.into(),
            fuel_record: plan.record.map(Into::into),
        }
    }
}
