//! Per-truck, per-journey fuel ledger.
//!
//! Yard allocations are positive; every going/returning checkpoint column
//! holds consumption as a negative magnitude. `balance` is therefore the
//! plain sum of all columns plus `extra`, and is never edited directly.

use super::checkpoint::{ColumnKind, LedgerColumn};
use super::normalize_truck;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub truck_no: String,
    pub truck_key: String,
    pub going_do: String,
    #[serde(default)]
    pub return_do: Option<String>,
    pub route_from: String,
    pub route_to: String,
    pub date: NaiveDate,

    #[serde(default)]
    pub dar_yard: Decimal,
    #[serde(default)]
    pub tanga_yard: Decimal,
    #[serde(default)]
    pub mmsa_yard: Decimal,
    #[serde(default)]
    pub dar_going: Decimal,
    #[serde(default)]
    pub moro_going: Decimal,
    #[serde(default)]
    pub mbeya_going: Decimal,
    #[serde(default)]
    pub tdm_going: Decimal,
    #[serde(default)]
    pub zambia_going: Decimal,
    #[serde(default)]
    pub congo_fuel: Decimal,
    #[serde(default)]
    pub zambia_ndola: Decimal,
    #[serde(default)]
    pub zambia_kapiri: Decimal,
    #[serde(default)]
    pub tdm_return: Decimal,
    #[serde(default)]
    pub mbeya_return: Decimal,
    #[serde(default)]
    pub moro_return: Decimal,
    #[serde(default)]
    pub dar_return: Decimal,
    #[serde(default)]
    pub tanga_return: Decimal,

    #[serde(default)]
    pub extra: Decimal,
    #[serde(default)]
    pub total_lts: Decimal,
    #[serde(default)]
    pub balance: Decimal,

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

impl FuelRecord {
    pub fn new(
        truck_no: &str,
        going_do: &str,
        route_from: &str,
        route_to: &str,
        date: NaiveDate,
        created_by: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            truck_no: truck_no.trim().to_string(),
            truck_key: normalize_truck(truck_no),
            going_do: going_do.trim().to_uppercase(),
            return_do: None,
            route_from: route_from.trim().to_string(),
            route_to: route_to.trim().to_string(),
            date,
            dar_yard: Decimal::ZERO,
            tanga_yard: Decimal::ZERO,
            mmsa_yard: Decimal::ZERO,
            dar_going: Decimal::ZERO,
            moro_going: Decimal::ZERO,
            mbeya_going: Decimal::ZERO,
            tdm_going: Decimal::ZERO,
            zambia_going: Decimal::ZERO,
            congo_fuel: Decimal::ZERO,
            zambia_ndola: Decimal::ZERO,
            zambia_kapiri: Decimal::ZERO,
            tdm_return: Decimal::ZERO,
            mbeya_return: Decimal::ZERO,
            moro_return: Decimal::ZERO,
            dar_return: Decimal::ZERO,
            tanga_return: Decimal::ZERO,
            extra: Decimal::ZERO,
            total_lts: Decimal::ZERO,
            balance: Decimal::ZERO,
            is_deleted: false,
            deleted_at: None,
            version: 0,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn column(&self, column: LedgerColumn) -> Decimal {
        match column {
            LedgerColumn::DarYard => self.dar_yard,
            LedgerColumn::TangaYard => self.tanga_yard,
            LedgerColumn::MmsaYard => self.mmsa_yard,
            LedgerColumn::DarGoing => self.dar_going,
            LedgerColumn::MoroGoing => self.moro_going,
            LedgerColumn::MbeyaGoing => self.mbeya_going,
            LedgerColumn::TdmGoing => self.tdm_going,
            LedgerColumn::ZambiaGoing => self.zambia_going,
            LedgerColumn::CongoFuel => self.congo_fuel,
            LedgerColumn::ZambiaNdola => self.zambia_ndola,
            LedgerColumn::ZambiaKapiri => self.zambia_kapiri,
            LedgerColumn::TdmReturn => self.tdm_return,
            LedgerColumn::MbeyaReturn => self.mbeya_return,
            LedgerColumn::MoroReturn => self.moro_return,
            LedgerColumn::DarReturn => self.dar_return,
            LedgerColumn::TangaReturn => self.tanga_return,
        }
    }

    fn column_mut(&mut self, column: LedgerColumn) -> &mut Decimal {
        match column {
            LedgerColumn::DarYard => &mut self.dar_yard,
            LedgerColumn::TangaYard => &mut self.tanga_yard,
            LedgerColumn::MmsaYard => &mut self.mmsa_yard,
            LedgerColumn::DarGoing => &mut self.dar_going,
            LedgerColumn::MoroGoing => &mut self.moro_going,
            LedgerColumn::MbeyaGoing => &mut self.mbeya_going,
            LedgerColumn::TdmGoing => &mut self.tdm_going,
            LedgerColumn::ZambiaGoing => &mut self.zambia_going,
            LedgerColumn::CongoFuel => &mut self.congo_fuel,
            LedgerColumn::ZambiaNdola => &mut self.zambia_ndola,
            LedgerColumn::ZambiaKapiri => &mut self.zambia_kapiri,
            LedgerColumn::TdmReturn => &mut self.tdm_return,
            LedgerColumn::MbeyaReturn => &mut self.mbeya_return,
            LedgerColumn::MoroReturn => &mut self.moro_return,
            LedgerColumn::DarReturn => &mut self.dar_return,
            LedgerColumn::TangaReturn => &mut self.tanga_return,
        }
    }

    /// Overwrite a column with a stored-convention value (negative for
    /// checkpoints) and recompute the derived totals.
    pub fn set_column(&mut self, column: LedgerColumn, value: Decimal) {
        *self.column_mut(column) = value;
        self.recompute();
    }

    pub fn set_extra(&mut self, extra: Decimal) {
        self.extra = extra;
        self.recompute();
    }

    /// Book `litres` (a positive quantity) against a column.
    pub fn apply_litres(&mut self, column: LedgerColumn, litres: Decimal) {
        *self.column_mut(column) += signed(column, litres);
        self.recompute();
    }

    /// Undo an earlier `apply_litres` with the same arguments.
    pub fn revert_litres(&mut self, column: LedgerColumn, litres: Decimal) {
        *self.column_mut(column) -= signed(column, litres);
        self.recompute();
    }

    /// Sum of every column plus `extra`.
    pub fn signed_sum(&self) -> Decimal {
        LedgerColumn::ALL
            .iter()
            .map(|c| self.column(*c))
            .sum::<Decimal>()
            + self.extra
    }

    /// Litres allocated to the journey: yard allocations plus extra fuel.
    pub fn allocated(&self) -> Decimal {
        LedgerColumn::ALL
            .iter()
            .filter(|c| c.kind() == ColumnKind::Yard)
            .map(|c| self.column(*c))
            .sum::<Decimal>()
            + self.extra
    }

    /// Litres drawn along the route, as a positive quantity.
    pub fn consumed(&self) -> Decimal {
        -LedgerColumn::ALL
            .iter()
            .filter(|c| c.kind() != ColumnKind::Yard)
            .map(|c| self.column(*c))
            .sum::<Decimal>()
    }

    pub fn recompute(&mut self) {
        self.total_lts = self.allocated();
        self.balance = self.signed_sum();
        self.updated_at = Utc::now();
    }

    /// Link the export DO that brings the truck back.
    pub fn attach_return_do(&mut self, do_no: &str) {
        self.return_do = Some(do_no.trim().to_uppercase());
        self.updated_at = Utc::now();
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
        self.updated_at = at;
    }

    /// Which leg a DO number belongs to on this journey, if any.
    pub fn leg_of(&self, do_no: &str) -> Option<super::Direction> {
        let do_no = do_no.trim();
        if self.going_do.eq_ignore_ascii_case(do_no) {
            Some(super::Direction::Going)
        } else if self
            .return_do
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case(do_no))
        {
            Some(super::Direction::Returning)
        } else {
            None
        }
    }
}

fn signed(column: LedgerColumn, litres: Decimal) -> Decimal {
    match column.kind() {
        ColumnKind::Yard => litres,
        ColumnKind::Going | ColumnKind::Returning => -litres,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    fn record() -> FuelRecord {
        FuelRecord::new(
            "T530 DRF",
            "DO-1001",
            "Dar es Salaam",
            "Lubumbashi",
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            "ops",
        )
    }

    #[test]
    fn balance_tracks_signed_sum_after_every_mutation() {
        let mut r = record();
        r.apply_litres(LedgerColumn::DarYard, Decimal::from(550));
        assert_eq!(r.balance, r.signed_sum());
        r.apply_litres(LedgerColumn::MbeyaGoing, Decimal::from(450));
        assert_eq!(r.balance, r.signed_sum());
        r.set_extra(Decimal::from(60));
        assert_eq!(r.balance, r.signed_sum());
        r.revert_litres(LedgerColumn::MbeyaGoing, Decimal::from(450));
        assert_eq!(r.balance, r.signed_sum());

        assert_eq!(r.balance, Decimal::from(610));
        assert_eq!(r.total_lts, Decimal::from(610));
    }

    #[test]
    fn checkpoint_litres_are_stored_negative() {
        let mut r = record();
        r.apply_litres(LedgerColumn::MbeyaGoing, Decimal::from(300));
        assert_eq!(r.mbeya_going, Decimal::from(-300));
        assert_eq!(r.consumed(), Decimal::from(300));
        assert_eq!(r.balance, Decimal::from(-300));
    }

    #[test]
    fn total_lts_counts_yards_and_extra_only() {
        let mut r = record();
        r.set_column(LedgerColumn::DarYard, Decimal::from(550));
        r.set_column(LedgerColumn::TangaYard, Decimal::from(100));
        r.set_column(LedgerColumn::ZambiaNdola, Decimal::from(-400));
        r.set_extra(Decimal::from(50));
        assert_eq!(r.total_lts, Decimal::from(700));
        assert_eq!(r.balance, Decimal::from(300));
    }

    #[test]
    fn leg_of_matches_going_and_return_do() {
        let mut r = record();
        r.attach_return_do("do-2002");
        assert_eq!(r.return_do.as_deref(), Some("DO-2002"));
        assert_eq!(r.leg_of("do-1001"), Some(Direction::Going));
        assert_eq!(r.leg_of(" DO-2002 "), Some(Direction::Returning));
        assert_eq!(r.leg_of("DO-9999"), None);
    }
}
