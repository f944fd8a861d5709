//! Fuel dispensed against a driver's own account, outside the normal DO flow.

use super::checkpoint::{CancellationPoint, Checkpoint, LedgerColumn};
use super::{normalize_truck, NIL};
use crate::domain::FuelError;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverAccountStatus {
    Pending,
    Settled,
    Disputed,
}

impl DriverAccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Settled => "settled",
            Self::Disputed => "disputed",
        }
    }
}

impl std::fmt::Display for DriverAccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DriverAccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "settled" => Ok(Self::Settled),
            "disputed" => Ok(Self::Disputed),
            _ => Err(format!(
                "Invalid status: {}. Must be one of: pending, settled, disputed",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverAccountEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub date: NaiveDate,
    pub month: u32,
    pub year: i32,
    pub truck_no: String,
    pub truck_key: String,
    #[serde(default)]
    pub driver_name: Option<String>,
    pub lpo_no: String,
    pub station: String,
    pub litres: Decimal,
    pub rate: Decimal,
    /// Always `litres * rate`; see [`DriverAccountEntry::recompute_amount`].
    pub amount: Decimal,
    #[serde(default)]
    pub cancellation_point: Option<CancellationPoint>,
    #[serde(default)]
    pub checkpoint: Option<Checkpoint>,
    #[serde(default)]
    pub reference_do: Option<String>,
    #[serde(default)]
    pub fuel_record_id: Option<String>,
    #[serde(default)]
    pub ledger_column: Option<LedgerColumn>,
    #[serde(default)]
    pub lpo_id: Option<String>,
    pub status: DriverAccountStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::opt_chrono_datetime_as_bson_datetime"
    )]
    pub settled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub settled_by: Option<String>,
    #[serde(default)]
    pub dispute_reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
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
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl DriverAccountEntry {
    pub fn new(
        date: NaiveDate,
        truck_no: &str,
        lpo_no: &str,
        station: &str,
        litres: Decimal,
        rate: Decimal,
        created_by: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            month: date.month(),
            year: date.year(),
            truck_no: truck_no.trim().to_string(),
            truck_key: normalize_truck(truck_no),
            driver_name: None,
            lpo_no: lpo_no.trim().to_string(),
            station: station.trim().to_string(),
            litres,
            rate,
            amount: litres * rate,
            cancellation_point: None,
            checkpoint: None,
            reference_do: None,
            fuel_record_id: None,
            ledger_column: None,
            lpo_id: None,
            status: DriverAccountStatus::Pending,
            settled_at: None,
            settled_by: None,
            dispute_reason: None,
            notes: None,
            is_deleted: false,
            deleted_at: None,
            version: 0,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn recompute_amount(&mut self) {
        self.amount = self.litres * self.rate;
        self.updated_at = Utc::now();
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
        self.month = date.month();
        self.year = date.year();
    }

    /// Litres already booked on a fuel record by this entry.
    pub fn booking(&self) -> Option<(&str, LedgerColumn, Decimal)> {
        match (&self.fuel_record_id, self.ledger_column) {
            (Some(record_id), Some(column)) if !self.is_deleted => {
                Some((record_id.as_str(), column, self.litres))
            }
            _ => None,
        }
    }

    pub fn settle(&mut self, settled_by: &str, at: DateTime<Utc>) -> Result<(), FuelError> {
        self.ensure_pending("settle")?;
        self.status = DriverAccountStatus::Settled;
        self.settled_by = Some(settled_by.to_string());
        self.settled_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn dispute(
        &mut self,
        disputed_by: &str,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), FuelError> {
        self.ensure_pending("dispute")?;
        self.status = DriverAccountStatus::Disputed;
        self.settled_by = Some(disputed_by.to_string());
        self.settled_at = Some(at);
        self.dispute_reason = reason;
        self.updated_at = at;
        Ok(())
    }

    fn ensure_pending(&self, action: &str) -> Result<(), FuelError> {
        if self.is_deleted {
            return Err(FuelError::NotFound(format!(
                "Driver account entry not found: {}",
                self.id
            )));
        }
        if self.status != DriverAccountStatus::Pending {
            return Err(FuelError::Conflict(format!(
                "Cannot {} driver account entry {}: already {}",
                action, self.id, self.status
            )));
        }
        Ok(())
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
        self.updated_at = at;
    }

    pub fn export_row(&self) -> DriverAccountExportRow {
        DriverAccountExportRow {
            date: self.date,
            month: self.month,
            year: self.year,
            truck_no: self.truck_no.clone(),
            driver_name: self.driver_name.clone(),
            lpo_no: self.lpo_no.clone(),
            station: self.station.clone(),
            do_no: NIL.to_string(),
            destination: NIL.to_string(),
            litres: self.litres,
            rate: self.rate,
            amount: self.amount,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverAccountExportRow {
    pub date: NaiveDate,
    pub month: u32,
    pub year: i32,
    pub truck_no: String,
    pub driver_name: Option<String>,
    pub lpo_no: String,
    pub station: String,
    pub do_no: String,
    pub destination: String,
    pub litres: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub status: DriverAccountStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> DriverAccountEntry {
        DriverAccountEntry::new(
            NaiveDate::from_ymd_opt(2025, 4, 9).unwrap(),
            "T530 DRF",
            "LPO-7",
            "Lake Oil Tunduma",
            Decimal::from(120),
            Decimal::from(3000),
            "clerk",
        )
    }

    #[test]
    fn pending_settles_once() {
        let mut e = entry();
        e.settle("accountant", Utc::now()).unwrap();
        assert_eq!(e.status, DriverAccountStatus::Settled);
        assert_eq!(e.settled_by.as_deref(), Some("accountant"));
        assert!(e.settled_at.is_some());

        let again = e.settle("accountant", Utc::now());
        assert!(matches!(again, Err(FuelError::Conflict(_))));
    }

    #[test]
    fn disputed_cannot_be_settled() {
        let mut e = entry();
        e.dispute("accountant", Some("meter mismatch".into()), Utc::now())
            .unwrap();
        assert!(matches!(
            e.settle("accountant", Utc::now()),
            Err(FuelError::Conflict(_))
        ));
    }

    #[test]
    fn amount_follows_edits() {
        let mut e = entry();
        assert_eq!(e.amount, Decimal::from(360_000));
        e.litres = Decimal::from(100);
        e.recompute_amount();
        assert_eq!(e.amount, Decimal::from(300_000));
    }

    #[test]
    fn export_hides_reference_do() {
        let mut e = entry();
        e.reference_do = Some("DO-1001".into());
        let row = e.export_row();
        assert_eq!(row.do_no, "NIL");
        assert_eq!(row.destination, "NIL");
    }

    #[test]
    fn month_and_year_follow_date() {
        let mut e = entry();
        e.set_date(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!((e.month, e.year), (12, 2024));
    }
}
