//! Local purchase order for diesel.

use super::checkpoint::{Checkpoint, Direction, LedgerColumn, PaymentMode};
use super::{normalize_truck, NIL};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LpoStatus {
    Pending,
    Sent,
    Completed,
    Cancelled,
}

impl LpoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for LpoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LpoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!(
                "Invalid status: {}. Must be one of: pending, sent, completed, cancelled",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpoEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub lpo_no: String,
    pub station: String,
    pub date: NaiveDate,
    pub truck_no: String,
    pub truck_key: String,
    pub do_no: String,
    pub destination: String,
    pub litres: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub direction: Option<Direction>,
    /// Checkpoint claimed by a CASH entry.
    #[serde(default)]
    pub checkpoint: Option<Checkpoint>,
    /// Ledger column the litres were booked to, if any.
    #[serde(default)]
    pub column: Option<LedgerColumn>,
    #[serde(default)]
    pub fuel_record_id: Option<String>,
    /// Linkage kept for driver-account entries; never exported.
    #[serde(default)]
    pub reference_do: Option<String>,
    #[serde(default)]
    pub driver_account_id: Option<String>,
    pub status: LpoStatus,
    #[serde(default)]
    pub cancelled_by: Option<String>,
    /// CASH entry that made this one stale.
    #[serde(default)]
    pub superseded_by: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::opt_chrono_datetime_as_bson_datetime"
    )]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::opt_chrono_datetime_as_bson_datetime"
    )]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: i64,
    pub created_by: String,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl LpoEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lpo_no: &str,
        station: &str,
        date: NaiveDate,
        truck_no: &str,
        do_no: &str,
        destination: &str,
        litres: Decimal,
        rate: Decimal,
        payment_mode: PaymentMode,
        created_by: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            lpo_no: lpo_no.trim().to_string(),
            station: station.trim().to_string(),
            date,
            truck_no: truck_no.trim().to_string(),
            truck_key: normalize_truck(truck_no),
            do_no: do_no.trim().to_string(),
            destination: destination.trim().to_string(),
            litres,
            rate,
            amount: litres * rate,
            payment_mode,
            direction: None,
            checkpoint: None,
            column: None,
            fuel_record_id: None,
            reference_do: None,
            driver_account_id: None,
            status: LpoStatus::Pending,
            cancelled_by: None,
            superseded_by: None,
            cancelled_at: None,
            is_deleted: false,
            deleted_at: None,
            version: 0,
            created_by: created_by.to_string(),
            approved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Not cancelled and not soft-deleted.
    pub fn is_open(&self) -> bool {
        !self.is_deleted && self.status != LpoStatus::Cancelled
    }

    /// Litres booked on a fuel record that must be reverted if this entry
    /// stops counting.
    pub fn booking(&self) -> Option<(&str, LedgerColumn, Decimal)> {
        match (&self.fuel_record_id, self.column) {
            (Some(record_id), Some(column)) if self.is_open() => {
                Some((record_id.as_str(), column, self.litres))
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self, cancelled_by: &str, at: DateTime<Utc>) {
        self.status = LpoStatus::Cancelled;
        self.cancelled_by = Some(cancelled_by.to_string());
        self.cancelled_at = Some(at);
        self.updated_at = at;
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
        self.updated_at = at;
    }

    pub fn export_row(&self) -> LpoExportRow {
        let hide_linkage = self.payment_mode == PaymentMode::DriverAccount;
        LpoExportRow {
            lpo_no: self.lpo_no.clone(),
            date: self.date,
            station: self.station.clone(),
            truck_no: self.truck_no.clone(),
            do_no: if hide_linkage {
                NIL.to_string()
            } else {
                self.do_no.clone()
            },
            destination: if hide_linkage {
                NIL.to_string()
            } else {
                self.destination.clone()
            },
            litres: self.litres,
            rate: self.rate,
            amount: self.amount,
            payment_mode: self.payment_mode,
            checkpoint: self.checkpoint.as_ref().map(Checkpoint::label),
            status: self.status,
            struck_through: self.status == LpoStatus::Cancelled,
        }
    }
}

/// Flat row handed to the reporting/print pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LpoExportRow {
    pub lpo_no: String,
    pub date: NaiveDate,
    pub station: String,
    pub truck_no: String,
    pub do_no: String,
    pub destination: String,
    pub litres: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub payment_mode: PaymentMode,
    pub checkpoint: Option<String>,
    pub status: LpoStatus,
    pub struck_through: bool,
}
