use super::{truck_param, DriverAccountResponse, FuelRecordResponse};
use crate::domain::{LpoPlan, NewLpo};
use crate::models::{
    CancellationPoint, Checkpoint, Direction, LedgerColumn, LpoEntry, LpoStatus, PaymentMode,
};
use crate::services::LpoFilter;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLpoRequest {
    #[validate(length(min = 1, message = "LPO number is required"))]
    pub lpo_no: String,
    #[validate(length(min = 1, message = "Station is required"))]
    pub station: String,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "Truck number is required"))]
    pub truck_no: String,
    pub do_no: Option<String>,
    pub destination: Option<String>,
    pub litres: Decimal,
    pub rate: Decimal,
    pub payment_mode: PaymentMode,
    pub cancellation_point: Option<CancellationPoint>,
    pub reference_do: Option<String>,
    pub driver_name: Option<String>,
}

impl CreateLpoRequest {
    pub fn into_new_lpo(self, created_by: String) -> NewLpo {
        NewLpo {
            lpo_no: self.lpo_no,
            station: self.station,
            date: self.date,
            truck_no: self.truck_no,
            do_no: self.do_no,
            destination: self.destination,
            litres: self.litres,
            rate: self.rate,
            payment_mode: self.payment_mode,
            cancellation_point: self.cancellation_point,
            reference_do: self.reference_do,
            driver_name: self.driver_name,
            created_by,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateLpoStatusRequest {
    pub status: LpoStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct LpoListParams {
    pub truck_no: Option<String>,
    pub station: Option<String>,
    pub status: Option<LpoStatus>,
    pub payment_mode: Option<PaymentMode>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_deleted: Option<bool>,
}

impl From<&LpoListParams> for LpoFilter {
    fn from(params: &LpoListParams) -> Self {
        Self {
            truck_key: truck_param(&params.truck_no),
            station: params
                .station
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            status: params.status,
            payment_mode: params.payment_mode,
            from: params.from,
            to: params.to,
            include_deleted: params.include_deleted.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LpoResponse {
    pub id: String,
    pub lpo_no: String,
    pub station: String,
    pub date: NaiveDate,
    pub truck_no: String,
    pub do_no: String,
    pub destination: String,
    pub litres: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub payment_mode: PaymentMode,
    pub direction: Option<Direction>,
    pub checkpoint: Option<Checkpoint>,
    pub checkpoint_label: Option<String>,
    pub column: Option<LedgerColumn>,
    pub fuel_record_id: Option<String>,
    pub reference_do: Option<String>,
    pub driver_account_id: Option<String>,
    pub status: LpoStatus,
    pub cancelled_by: Option<String>,
    pub cancelled_at: Option<String>,
    pub superseded_by: Option<String>,
    pub is_deleted: bool,
    pub version: i64,
    pub created_by: String,
    pub approved_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<LpoEntry> for LpoResponse {
    fn from(lpo: LpoEntry) -> Self {
        Self {
            checkpoint_label: lpo.checkpoint.as_ref().map(Checkpoint::label),
            id: lpo.id,
            lpo_no: lpo.lpo_no,
            station: lpo.station,
            date: lpo.date,
            truck_no: lpo.truck_no,
            do_no: lpo.do_no,
            destination: lpo.destination,
            litres: lpo.litres,
            rate: lpo.rate,
            amount: lpo.amount,
            payment_mode: lpo.payment_mode,
            direction: lpo.direction,
            checkpoint: lpo.checkpoint,
            column: lpo.column,
            fuel_record_id: lpo.fuel_record_id,
            reference_do: lpo.reference_do,
            driver_account_id: lpo.driver_account_id,
            status: lpo.status,
            cancelled_by: lpo.cancelled_by,
            cancelled_at: lpo.cancelled_at.map(|t| t.to_rfc3339()),
            superseded_by: lpo.superseded_by,
            is_deleted: lpo.is_deleted,
            version: lpo.version,
            created_by: lpo.created_by,
            approved_by: lpo.approved_by,
            created_at: lpo.created_at.to_rfc3339(),
            updated_at: lpo.updated_at.to_rfc3339(),
        }
    }
}

/// Result of creating an LPO: the new entry plus every document the
/// same commit touched.
#[derive(Debug, Serialize)]
pub struct CreateLpoResponse {
    pub lpo: LpoResponse,
    pub cancelled: Vec<LpoResponse>,
    pub fuel_records: Vec<FuelRecordResponse>,
    pub driver_account: Option<DriverAccountResponse>,
    pub released_driver_accounts: Vec<DriverAccountResponse>,
}

impl From<LpoPlan> for CreateLpoResponse {
    fn from(plan: LpoPlan) -> Self {
        Self {
            lpo: plan.entry.into(),
            cancelled: plan.cancelled.into_iter().map(Into::into).collect(),
            fuel_records: plan.records.into_iter().map(Into::into).collect(),
            driver_account: plan.driver_account.map(Into::into),
            released_driver_accounts: plan
                .released_accounts
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}
