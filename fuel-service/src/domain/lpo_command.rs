//! LPO creation as one command.
//!
//! `LpoCommand::new` validates and resolves the payload without touching
//! any state. The caller then loads what `record_lookup` and
//! `needs_candidates` ask for, and `plan` computes every document the
//! request changes: stale LPOs to cancel, the pending driver-account rows
//! behind cancelled DRIVER_ACCOUNT LPOs, updated fuel records, the new
//! entry and (for DRIVER_ACCOUNT) its driver-account row. The store commits
//! the plan atomically with version guards.

use super::error::{FuelError, FuelResult};
use super::matcher::find_cancellation_targets;
use super::resolver::{resolve_for_lpo, StationSnapshot};
use super::settlement::release_booking;
use crate::models::{
    normalize_truck, CancellationPoint, Checkpoint, DriverAccountEntry, DriverAccountStatus,
    FuelRecord, LpoEntry, PaymentMode, NIL,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct NewLpo {
    pub lpo_no: String,
    pub station: String,
    pub date: NaiveDate,
    pub truck_no: String,
    pub do_no: Option<String>,
    pub destination: Option<String>,
    pub litres: Decimal,
    pub rate: Decimal,
    pub payment_mode: PaymentMode,
    pub cancellation_point: Option<CancellationPoint>,
    pub reference_do: Option<String>,
    pub driver_name: Option<String>,
    pub created_by: String,
}

/// Which fuel record the command needs to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLookup {
    None,
    ByDo { truck_key: String, do_no: String },
    LatestForTruck { truck_key: String },
}

#[derive(Debug, Clone)]
pub struct LpoPlan {
    pub entry: LpoEntry,
    pub cancelled: Vec<LpoEntry>,
    pub records: Vec<FuelRecord>,
    pub driver_account: Option<DriverAccountEntry>,
    /// Account rows retired with the DRIVER_ACCOUNT LPOs in `cancelled`.
    pub released_accounts: Vec<DriverAccountEntry>,
}

#[derive(Debug)]
pub struct LpoCommand {
    input: NewLpo,
    checkpoint: Option<Checkpoint>,
}

impl LpoCommand {
    pub fn new(input: NewLpo) -> FuelResult<Self> {
        // Checkpoint presence is checked before anything else.
        let checkpoint = resolve_for_lpo(input.payment_mode, input.cancellation_point.as_ref())?;

        if input.lpo_no.trim().is_empty() {
            return Err(FuelError::validation("lpo_no", "LPO number is required"));
        }
        if input.station.trim().is_empty() {
            return Err(FuelError::validation("station", "station is required"));
        }
        if normalize_truck(&input.truck_no).is_empty() {
            return Err(FuelError::validation("truck_no", "truck number is required"));
        }
        if input.litres <= Decimal::ZERO {
            return Err(FuelError::validation("litres", "litres must be positive"));
        }
        if input.rate < Decimal::ZERO {
            return Err(FuelError::validation("rate", "rate cannot be negative"));
        }
        if input.payment_mode != PaymentMode::DriverAccount && blank(input.do_no.as_deref()) {
            return Err(FuelError::validation(
                "do_no",
                format!("{} entries must reference a DO", input.payment_mode),
            ));
        }

        Ok(Self { input, checkpoint })
    }

    pub fn checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoint.as_ref()
    }

    pub fn truck_key(&self) -> String {
        normalize_truck(&self.input.truck_no)
    }

    pub fn record_lookup(&self) -> RecordLookup {
        let truck_key = self.truck_key();
        match self.input.payment_mode {
            PaymentMode::Station | PaymentMode::Cash => RecordLookup::ByDo {
                truck_key,
                do_no: self.input.do_no.clone().unwrap_or_default().trim().to_string(),
            },
            PaymentMode::DriverAccount if self.checkpoint.is_some() => {
                match self.input.reference_do.as_deref().filter(|d| !d.trim().is_empty()) {
                    Some(do_no) => RecordLookup::ByDo {
                        truck_key,
                        do_no: do_no.trim().to_string(),
                    },
                    None => RecordLookup::LatestForTruck { truck_key },
                }
            }
            PaymentMode::DriverAccount => RecordLookup::None,
        }
    }

    /// Only CASH entries scan for stale LPOs.
    pub fn needs_candidates(&self) -> bool {
        self.input.payment_mode == PaymentMode::Cash
    }

    /// Candidates this command would cancel.
    pub fn targets<'a>(
        &self,
        candidates: &'a [LpoEntry],
        snapshot: &StationSnapshot,
    ) -> Vec<&'a LpoEntry> {
        match (&self.checkpoint, self.input.payment_mode) {
            (Some(checkpoint), PaymentMode::Cash) => {
                find_cancellation_targets(&self.input.truck_no, checkpoint, candidates, snapshot)
            }
            _ => Vec::new(),
        }
    }

    /// Driver-account rows behind the DRIVER_ACCOUNT targets.
    pub fn linked_account_ids(
        &self,
        candidates: &[LpoEntry],
        snapshot: &StationSnapshot,
    ) -> Vec<String> {
        self.targets(candidates, snapshot)
            .into_iter()
            .filter(|t| t.payment_mode == PaymentMode::DriverAccount)
            .filter_map(|t| t.driver_account_id.clone())
            .collect()
    }

    /// Fuel records other than `record` that cancelled targets, or the
    /// account rows behind them, were booked on.
    pub fn related_record_ids(
        &self,
        candidates: &[LpoEntry],
        snapshot: &StationSnapshot,
        linked_accounts: &[DriverAccountEntry],
        record: Option<&FuelRecord>,
    ) -> Vec<String> {
        let mut ids: Vec<String> = self
            .targets(candidates, snapshot)
            .into_iter()
            .filter_map(|t| t.booking().map(|(id, _, _)| id.to_string()))
            .chain(
                linked_accounts
                    .iter()
                    .filter_map(|a| a.booking().map(|(id, _, _)| id.to_string())),
            )
            .filter(|id| record.map_or(true, |r| &r.id != id))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn plan(
        self,
        snapshot: &StationSnapshot,
        record: Option<FuelRecord>,
        candidates: &[LpoEntry],
        related_records: Vec<FuelRecord>,
        linked_accounts: Vec<DriverAccountEntry>,
        now: DateTime<Utc>,
    ) -> FuelResult<LpoPlan> {
        let input = &self.input;
        let do_no = input
            .do_no
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(NIL);
        let destination = input
            .destination
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(NIL);

        let mut entry = LpoEntry::new(
            &input.lpo_no,
            &input.station,
            input.date,
            &input.truck_no,
            do_no,
            destination,
            input.litres,
            input.rate,
            input.payment_mode,
            &input.created_by,
        );
        entry.reference_do = input.reference_do.clone();
        entry.checkpoint = self.checkpoint.clone();
        entry.created_at = now;
        entry.updated_at = now;

        let mut records: HashMap<String, FuelRecord> = related_records
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        let mut touched = HashSet::new();
        let mut cancelled = Vec::new();
        let mut released_accounts = Vec::new();
        let mut driver_account = None;
        let mut linked: HashMap<String, DriverAccountEntry> = linked_accounts
            .into_iter()
            .filter(|a| !a.is_deleted)
            .map(|a| (a.id.clone(), a))
            .collect();

        match input.payment_mode {
            PaymentMode::Station => {
                let mut record = require_record(record, input)?;
                let direction = record.leg_of(do_no).ok_or_else(|| {
                    FuelError::NotFound(format!(
                        "DO {} is not part of fuel record {}",
                        do_no, record.id
                    ))
                })?;
                let column = snapshot.checkpoint_for(&input.station, direction)?.column();

                record.apply_litres(column, input.litres);
                entry.direction = Some(direction);
                entry.column = Some(column);
                entry.fuel_record_id = Some(record.id.clone());
                touched.insert(record.id.clone());
                records.insert(record.id.clone(), record);
            }
            PaymentMode::Cash => {
                let checkpoint = self.checkpoint.as_ref().ok_or_else(|| {
                    FuelError::MissingCheckpointSelection(
                        "CASH entries must name the checkpoint being paid for".to_string(),
                    )
                })?;
                let record = require_record(record, input)?;
                if record.leg_of(do_no) != Some(checkpoint.direction()) {
                    return Err(FuelError::validation(
                        "cancellation_point",
                        format!(
                            "DO {} is not the {} DO of this journey",
                            do_no,
                            checkpoint.direction()
                        ),
                    ));
                }
                records.insert(record.id.clone(), record.clone());

                for target in self.targets(candidates, snapshot) {
                    let mut stale = target.clone();
                    if let Some((record_id, column, litres)) = stale.booking() {
                        match records.get_mut(record_id) {
                            Some(booked) => {
                                booked.revert_litres(column, litres);
                                touched.insert(record_id.to_string());
                            }
                            None => tracing::warn!(
                                lpo_id = %stale.id,
                                fuel_record_id = %record_id,
                                "Stale LPO booked on a missing fuel record; nothing to revert"
                            ),
                        }
                    }
                    // A DRIVER_ACCOUNT row books through its account entry.
                    if let Some(mut account) = stale
                        .driver_account_id
                        .as_deref()
                        .and_then(|id| linked.remove(id))
                    {
                        if account.status != DriverAccountStatus::Pending {
                            return Err(FuelError::Conflict(format!(
                                "Driver account entry {} behind LPO {} is already {}",
                                account.id, stale.lpo_no, account.status
                            )));
                        }
                        if let Some((record_id, _, _)) = account.booking() {
                            let record_id = record_id.to_string();
                            match records.get_mut(&record_id) {
                                Some(booked) => {
                                    release_booking(&account, booked);
                                    touched.insert(record_id);
                                }
                                None => tracing::warn!(
                                    driver_account_id = %account.id,
                                    fuel_record_id = %record_id,
                                    "Driver account booked on a missing fuel record; nothing to revert"
                                ),
                            }
                        }
                        account.soft_delete(now);
                        released_accounts.push(account);
                    }
                    stale.cancel(&input.created_by, now);
                    stale.superseded_by = Some(entry.id.clone());
                    cancelled.push(stale);
                }

                let column = checkpoint.column();
                if let Some(target_record) = records.get_mut(&record.id) {
                    target_record.apply_litres(column, input.litres);
                }
                touched.insert(record.id.clone());
                entry.direction = Some(checkpoint.direction());
                entry.column = Some(column);
                entry.fuel_record_id = Some(record.id);
            }
            PaymentMode::DriverAccount => {
                let mut account = DriverAccountEntry::new(
                    input.date,
                    &input.truck_no,
                    &input.lpo_no,
                    &input.station,
                    input.litres,
                    input.rate,
                    &input.created_by,
                );
                account.driver_name = input.driver_name.clone();
                account.reference_do = input.reference_do.clone();
                account.cancellation_point = input.cancellation_point.clone();
                account.lpo_id = Some(entry.id.clone());

                if let Some(checkpoint) = &self.checkpoint {
                    let mut record = require_record(record, input)?;
                    record.apply_litres(checkpoint.column(), input.litres);
                    account.checkpoint = Some(checkpoint.clone());
                    account.ledger_column = Some(checkpoint.column());
                    account.fuel_record_id = Some(record.id.clone());
                    touched.insert(record.id.clone());
                    records.insert(record.id.clone(), record);
                }

                entry.driver_account_id = Some(account.id.clone());
                driver_account = Some(account);
            }
        }

        // Only records that actually changed are written back.
        let records = records
            .into_values()
            .filter(|r| touched.contains(&r.id))
            .collect();

        Ok(LpoPlan {
            entry,
            cancelled,
            records,
            driver_account,
            released_accounts,
        })
    }
}

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn require_record(record: Option<FuelRecord>, input: &NewLpo) -> FuelResult<FuelRecord> {
    record.filter(|r| !r.is_deleted).ok_or_else(|| {
        FuelError::NotFound(format!(
            "No active fuel record for truck {} and DO {}",
            input.truck_no,
            input
                .do_no
                .as_deref()
                .or(input.reference_do.as_deref())
                .unwrap_or(NIL)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CheckpointSelection, CustomStationSelection, Direction, FixedCheckpoint, LedgerColumn,
        LpoStatus, StationConfig,
    };

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
    }

    fn snapshot() -> StationSnapshot {
        StationSnapshot::new(vec![StationConfig::new(
            "Station X",
            Some(FixedCheckpoint::MbeyaGoing),
            Some(FixedCheckpoint::MbeyaReturn),
            None,
        )])
    }

    fn record() -> FuelRecord {
        let mut r = FuelRecord::new("T530 DRF", "DO-1", "Dar", "Lusaka", day(), "ops");
        r.attach_return_do("DO-2");
        r.set_column(LedgerColumn::DarYard, Decimal::from(550));
        r
    }

    fn input(mode: PaymentMode) -> NewLpo {
        NewLpo {
            lpo_no: "LPO-100".to_string(),
            station: "Station X".to_string(),
            date: day(),
            truck_no: "T530 DRF".to_string(),
            do_no: Some("DO-1".to_string()),
            destination: Some("Lusaka".to_string()),
            litres: Decimal::from(200),
            rate: Decimal::from(3000),
            payment_mode: mode,
            cancellation_point: None,
            reference_do: None,
            driver_name: None,
            created_by: "clerk".to_string(),
        }
    }

    fn mbeya_going_point() -> CancellationPoint {
        CancellationPoint {
            direction: Direction::Going,
            selection: CheckpointSelection::Fixed {
                checkpoint: FixedCheckpoint::MbeyaGoing,
            },
        }
    }

    fn booked_station_lpo(record: &FuelRecord) -> LpoEntry {
        let mut row = LpoEntry::new(
            "LPO-050",
            "Station X",
            day(),
            "t530drf",
            "DO-1",
            "Lusaka",
            Decimal::from(150),
            Decimal::from(3000),
            PaymentMode::Station,
            "clerk",
        );
        row.fuel_record_id = Some(record.id.clone());
        row.column = Some(LedgerColumn::MbeyaGoing);
        row
    }

    #[test]
    fn station_mode_books_the_station_column_for_the_do_leg() {
        let cmd = LpoCommand::new(input(PaymentMode::Station)).unwrap();
        let plan = cmd
            .plan(&snapshot(), Some(record()), &[], vec![], vec![], Utc::now())
            .unwrap();

        assert_eq!(plan.entry.column, Some(LedgerColumn::MbeyaGoing));
        assert_eq!(plan.entry.direction, Some(Direction::Going));
        assert_eq!(plan.records.len(), 1);
        assert_eq!(plan.records[0].mbeya_going, Decimal::from(-200));
        assert_eq!(plan.records[0].balance, Decimal::from(350));
        assert!(plan.cancelled.is_empty());
    }

    #[test]
    fn cash_without_point_fails_before_field_validation() {
        let mut bad = input(PaymentMode::Cash);
        bad.lpo_no = String::new();
        assert!(matches!(
            LpoCommand::new(bad),
            Err(FuelError::MissingCheckpointSelection(_))
        ));
    }

    #[test]
    fn cash_cancels_stale_rows_and_moves_the_booking() {
        let mut record = record();
        let stale = booked_station_lpo(&record);
        record.apply_litres(LedgerColumn::MbeyaGoing, stale.litres);

        let mut cash = input(PaymentMode::Cash);
        cash.cancellation_point = Some(mbeya_going_point());
        let cmd = LpoCommand::new(cash).unwrap();
        assert!(cmd.needs_candidates());

        let candidates = vec![stale];
        let plan = cmd
            .plan(&snapshot(), Some(record), &candidates, vec![], vec![], Utc::now())
            .unwrap();

        assert_eq!(plan.cancelled.len(), 1);
        assert_eq!(plan.cancelled[0].status, LpoStatus::Cancelled);
        assert_eq!(plan.cancelled[0].superseded_by.as_deref(), Some(plan.entry.id.as_str()));
        assert_eq!(plan.records.len(), 1);
        // 150 reverted, 200 booked
        assert_eq!(plan.records[0].mbeya_going, Decimal::from(-200));
        assert_eq!(plan.records[0].balance, plan.records[0].signed_sum());
    }

    #[test]
    fn cash_releases_the_account_row_behind_a_driver_account_lpo() {
        let mut record = record();
        let mut account = DriverAccountEntry::new(
            day(),
            "T530 DRF",
            "DA-010",
            "Station X",
            Decimal::from(90),
            Decimal::from(3000),
            "clerk",
        );
        account.ledger_column = Some(LedgerColumn::MbeyaGoing);
        account.fuel_record_id = Some(record.id.clone());
        record.apply_litres(LedgerColumn::MbeyaGoing, account.litres);

        let mut stale = LpoEntry::new(
            "DA-010",
            "Station X",
            day(),
            "T530 DRF",
            NIL,
            NIL,
            Decimal::from(90),
            Decimal::from(3000),
            PaymentMode::DriverAccount,
            "clerk",
        );
        stale.driver_account_id = Some(account.id.clone());
        account.lpo_id = Some(stale.id.clone());

        let mut cash = input(PaymentMode::Cash);
        cash.cancellation_point = Some(mbeya_going_point());
        let cmd = LpoCommand::new(cash).unwrap();
        let candidates = vec![stale];
        assert_eq!(
            cmd.linked_account_ids(&candidates, &snapshot()),
            vec![account.id.clone()]
        );
        assert!(cmd
            .related_record_ids(&candidates, &snapshot(), &[account.clone()], Some(&record))
            .is_empty());

        let plan = cmd
            .plan(&snapshot(), Some(record), &candidates, vec![], vec![account], Utc::now())
            .unwrap();

        assert_eq!(plan.cancelled.len(), 1);
        assert_eq!(plan.released_accounts.len(), 1);
        assert!(plan.released_accounts[0].is_deleted);
        assert_eq!(plan.records.len(), 1);
        // 90 released, 200 booked
        assert_eq!(plan.records[0].mbeya_going, Decimal::from(-200));
        assert_eq!(plan.records[0].balance, Decimal::from(350));
    }

    #[test]
    fn cash_refuses_to_cancel_over_a_settled_account_row() {
        let mut account = DriverAccountEntry::new(
            day(),
            "T530 DRF",
            "DA-011",
            "Station X",
            Decimal::from(90),
            Decimal::from(3000),
            "clerk",
        );
        account.settle("supervisor", Utc::now()).unwrap();
        let mut stale = LpoEntry::new(
            "DA-011",
            "Station X",
            day(),
            "T530 DRF",
            NIL,
            NIL,
            Decimal::from(90),
            Decimal::from(3000),
            PaymentMode::DriverAccount,
            "clerk",
        );
        stale.driver_account_id = Some(account.id.clone());

        let mut cash = input(PaymentMode::Cash);
        cash.cancellation_point = Some(mbeya_going_point());
        let cmd = LpoCommand::new(cash).unwrap();
        let result = cmd.plan(&snapshot(), Some(record()), &[stale], vec![], vec![account], Utc::now());

        assert!(matches!(result, Err(FuelError::Conflict(_))));
    }

    #[test]
    fn cash_point_must_match_the_do_leg() {
        let mut cash = input(PaymentMode::Cash);
        cash.do_no = Some("DO-2".to_string());
        cash.cancellation_point = Some(mbeya_going_point());
        let cmd = LpoCommand::new(cash).unwrap();
        assert!(matches!(
            cmd.plan(&snapshot(), Some(record()), &[], vec![], vec![], Utc::now()),
            Err(FuelError::Validation { .. })
        ));
    }

    #[test]
    fn stale_row_on_another_record_is_reverted_there() {
        let primary = record();
        let mut older = FuelRecord::new("T530 DRF", "DO-0", "Dar", "Ndola", day(), "ops");
        let stale = booked_station_lpo(&older);
        older.apply_litres(LedgerColumn::MbeyaGoing, stale.litres);

        let mut cash = input(PaymentMode::Cash);
        cash.cancellation_point = Some(mbeya_going_point());
        let cmd = LpoCommand::new(cash).unwrap();
        let candidates = vec![stale];
        assert_eq!(
            cmd.related_record_ids(&candidates, &snapshot(), &[], Some(&primary)),
            vec![older.id.clone()]
        );

        let older_id = older.id.clone();
        let plan = cmd
            .plan(&snapshot(), Some(primary), &candidates, vec![older], vec![], Utc::now())
            .unwrap();
        assert_eq!(plan.records.len(), 2);
        let reverted = plan.records.iter().find(|r| r.id == older_id).unwrap();
        assert_eq!(reverted.mbeya_going, Decimal::ZERO);
    }

    #[test]
    fn driver_account_books_only_through_its_account_row() {
        let mut da = input(PaymentMode::DriverAccount);
        da.do_no = None;
        da.destination = None;
        da.reference_do = Some("DO-1".to_string());
        da.cancellation_point = Some(CancellationPoint {
            direction: Direction::Going,
            selection: CheckpointSelection::Custom(CustomStationSelection {
                station_name: "Custom1".to_string(),
                going_enabled: true,
                going_column: Some(LedgerColumn::ZambiaGoing),
                returning_enabled: false,
                returning_column: None,
            }),
        });
        let cmd = LpoCommand::new(da).unwrap();
        assert_eq!(
            cmd.record_lookup(),
            RecordLookup::ByDo {
                truck_key: "T530DRF".to_string(),
                do_no: "DO-1".to_string()
            }
        );

        let plan = cmd
            .plan(&snapshot(), Some(record()), &[], vec![], vec![], Utc::now())
            .unwrap();
        let account = plan.driver_account.unwrap();
        assert_eq!(plan.entry.do_no, NIL);
        assert_eq!(plan.entry.column, None);
        assert_eq!(plan.entry.driver_account_id.as_deref(), Some(account.id.as_str()));
        assert_eq!(account.ledger_column, Some(LedgerColumn::ZambiaGoing));
        assert_eq!(plan.records[0].zambia_going, Decimal::from(-200));
    }

    #[test]
    fn driver_account_without_point_leaves_the_ledger_alone() {
        let mut da = input(PaymentMode::DriverAccount);
        da.do_no = None;
        let cmd = LpoCommand::new(da).unwrap();
        assert_eq!(cmd.record_lookup(), RecordLookup::None);
        let plan = cmd.plan(&snapshot(), None, &[], vec![], vec![], Utc::now()).unwrap();
        assert!(plan.records.is_empty());
        assert!(plan.driver_account.is_some());
    }

    #[test]
    fn station_mode_rejects_non_positive_litres() {
        let mut bad = input(PaymentMode::Station);
        bad.litres = Decimal::ZERO;
        assert!(matches!(
            LpoCommand::new(bad),
            Err(FuelError::Validation { field: "litres", .. })
        ));
    }
}
