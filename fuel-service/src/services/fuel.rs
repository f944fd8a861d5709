//! Request orchestration: load what a rule needs, run it, commit the result.

use super::metrics;
use super::store::{
    DeliveryOrderFilter, FuelStore, LpoFilter, RecordFilter, UnitOfWork,
};
use crate::domain::{
    detect_extra_fuel, extra_fuel_report, route_totals, station_costs, truck_efficiency,
    EfficiencyBands, ExtraFuelFlag, ExtraFuelStandards, FuelError, FuelResult, LpoCommand,
    LpoPlan, NewLpo, RecordExtraFuel, RecordLookup, RouteTotal, StationCost, StationSnapshot,
    TruckEfficiency,
};
use crate::domain::settlement::release_booking;
use crate::models::{
    normalize_truck, station_key, ColumnKind, DeliveryOrder, Direction, DoType, DriverAccountStatus,
    FixedCheckpoint, FuelRecord, ImportExport, LedgerColumn, LpoEntry, LpoExportRow, LpoStatus,
    PaymentMode, StationConfig,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct NewStation {
    pub name: String,
    pub going_checkpoint: Option<FixedCheckpoint>,
    pub returning_checkpoint: Option<FixedCheckpoint>,
    pub default_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct StationUpdate {
    pub active: Option<bool>,
    pub going_checkpoint: Option<FixedCheckpoint>,
    pub returning_checkpoint: Option<FixedCheckpoint>,
    pub default_rate: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct NewDeliveryOrder {
    pub do_no: String,
    pub do_type: DoType,
    pub import_export: ImportExport,
    pub date: NaiveDate,
    pub truck_no: String,
    pub trailer_no: Option<String>,
    pub driver_name: Option<String>,
    pub client_name: String,
    pub loading_point: String,
    pub destination: String,
    pub cargo: Option<String>,
    pub tonnage: Option<Decimal>,
    pub rate_per_ton: Option<Decimal>,
    /// Yard allocation booked on the record a going DO opens.
    pub initial_yard: Option<(LedgerColumn, Decimal)>,
}

#[derive(Debug, Clone)]
pub struct NewFuelRecord {
    pub truck_no: String,
    pub going_do: String,
    pub route_from: String,
    pub route_to: String,
    pub date: NaiveDate,
    pub yard: BTreeMap<LedgerColumn, Decimal>,
    pub extra: Option<Decimal>,
}

/// Direct column edits in the stored sign convention.
#[derive(Debug, Clone, Default)]
pub struct ColumnUpdate {
    pub expected_version: Option<i64>,
    pub columns: BTreeMap<LedgerColumn, Decimal>,
    pub extra: Option<Decimal>,
}

/// Everything a successful DO entry changed.
#[derive(Debug, Clone)]
pub struct DeliveryOrderOutcome {
    pub delivery_order: DeliveryOrder,
    pub record: FuelRecord,
}

#[derive(Clone)]
pub struct FuelService {
    pub(crate) store: Arc<dyn FuelStore>,
    pub(crate) standards: ExtraFuelStandards,
    pub(crate) bands: EfficiencyBands,
}

impl FuelService {
    pub fn new(
        store: Arc<dyn FuelStore>,
        standards: ExtraFuelStandards,
        bands: EfficiencyBands,
    ) -> Self {
        Self {
            store,
            standards,
            bands,
        }
    }

    pub(crate) async fn commit(&self, work: UnitOfWork) -> FuelResult<UnitOfWork> {
        match self.store.commit(work).await {
            Err(FuelError::Conflict(message)) => {
                metrics::record_conflict();
                tracing::warn!(reason = %message, "Ledger commit rejected");
                Err(FuelError::Conflict(message))
            }
            other => other,
        }
    }

    // ---- stations ----

    pub async fn snapshot(&self) -> FuelResult<StationSnapshot> {
        Ok(StationSnapshot::new(self.store.list_stations().await?))
    }

    #[tracing::instrument(skip(self, input), fields(station = %input.name))]
    pub async fn create_station(&self, input: NewStation) -> FuelResult<StationConfig> {
        if input.name.trim().is_empty() {
            return Err(FuelError::validation("name", "station name is required"));
        }
        ensure_leg(input.going_checkpoint, Direction::Going, "going_checkpoint")?;
        ensure_leg(
            input.returning_checkpoint,
            Direction::Returning,
            "returning_checkpoint",
        )?;
        ensure_rate(input.default_rate)?;

        let station = StationConfig::new(
            &input.name,
            input.going_checkpoint,
            input.returning_checkpoint,
            input.default_rate,
        );
        self.store.insert_station(&station).await?;
        tracing::info!(key = %station.key, "Station created");
        Ok(station)
    }

    pub async fn list_stations(&self) -> FuelResult<Vec<StationConfig>> {
        self.store.list_stations().await
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_station(
        &self,
        name: &str,
        update: StationUpdate,
    ) -> FuelResult<StationConfig> {
        let mut station = self
            .store
            .find_station(&station_key(name))
            .await?
            .ok_or_else(|| FuelError::NotFound(format!("Station not found: {}", name)))?;

        if let Some(active) = update.active {
            station.active = active;
        }
        if update.going_checkpoint.is_some() {
            ensure_leg(update.going_checkpoint, Direction::Going, "going_checkpoint")?;
            station.going_checkpoint = update.going_checkpoint;
        }
        if update.returning_checkpoint.is_some() {
            ensure_leg(
                update.returning_checkpoint,
                Direction::Returning,
                "returning_checkpoint",
            )?;
            station.returning_checkpoint = update.returning_checkpoint;
        }
        if update.default_rate.is_some() {
            ensure_rate(update.default_rate)?;
            station.default_rate = update.default_rate;
        }
        station.updated_at = Utc::now();

        self.store.replace_station(&station).await?;
        tracing::info!(key = %station.key, active = station.active, "Station updated");
        Ok(station)
    }

    // ---- delivery orders ----

    #[tracing::instrument(skip(self, input), fields(do_no = %input.do_no, truck_no = %input.truck_no))]
    pub async fn create_delivery_order(
        &self,
        input: NewDeliveryOrder,
        created_by: &str,
    ) -> FuelResult<DeliveryOrderOutcome> {
        for (field, value) in [
            ("do_no", &input.do_no),
            ("truck_no", &input.truck_no),
            ("client_name", &input.client_name),
            ("loading_point", &input.loading_point),
            ("destination", &input.destination),
        ] {
            if value.trim().is_empty() {
                return Err(FuelError::validation(field, format!("{} is required", field)));
            }
        }
        if let Some((column, litres)) = input.initial_yard {
            if column.kind() != ColumnKind::Yard {
                return Err(FuelError::validation(
                    "initial_yard",
                    format!("{} is not a yard column", column),
                ));
            }
            if litres <= Decimal::ZERO {
                return Err(FuelError::validation(
                    "initial_yard",
                    "yard allocation must be positive",
                ));
            }
        }
        if self
            .store
            .find_delivery_order_by_no(&input.do_no)
            .await?
            .is_some()
        {
            return Err(FuelError::Conflict(format!(
                "Delivery order already exists: {}",
                input.do_no.trim().to_uppercase()
            )));
        }

        let mut order = DeliveryOrder::new(
            &input.do_no,
            input.do_type,
            input.import_export,
            input.date,
            &input.truck_no,
            &input.client_name,
            &input.loading_point,
            &input.destination,
            created_by,
        );
        order.trailer_no = input.trailer_no;
        order.driver_name = input.driver_name;
        order.cargo = input.cargo;
        order.tonnage = input.tonnage;
        order.rate_per_ton = input.rate_per_ton;

        let mut work = UnitOfWork::default();
        match order.direction() {
            Direction::Going => {
                let mut record = FuelRecord::new(
                    &order.truck_no,
                    &order.do_no,
                    &order.loading_point,
                    &order.destination,
                    order.date,
                    created_by,
                );
                if let Some((column, litres)) = input.initial_yard {
                    record.apply_litres(column, litres);
                }
                order.fuel_record_id = Some(record.id.clone());
                work.new_records.push(record);
            }
            Direction::Returning => {
                let mut record = self
                    .store
                    .record_awaiting_return(&order.truck_key)
                    .await?
                    .ok_or_else(|| {
                        FuelError::NotFound(format!(
                            "No fuel record awaiting a return DO for truck {}",
                            order.truck_no
                        ))
                    })?;
                record.attach_return_do(&order.do_no);
                order.fuel_record_id = Some(record.id.clone());
                work.updated_records.push(record);
            }
        }
        work.new_delivery_orders.push(order);

        let mut committed = self.commit(work).await?;
        let record = committed
            .new_records
            .pop()
            .or_else(|| committed.updated_records.pop())
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed DO without a record")))?;
        let delivery_order = committed
            .new_delivery_orders
            .pop()
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed DO missing")))?;

        tracing::info!(
            do_id = %delivery_order.id,
            fuel_record_id = %record.id,
            direction = %delivery_order.direction(),
            "Delivery order recorded"
        );
        Ok(DeliveryOrderOutcome {
            delivery_order,
            record,
        })
    }

    pub async fn get_delivery_order(&self, id: &str) -> FuelResult<DeliveryOrder> {
        self.store
            .find_delivery_order(id)
            .await?
            .ok_or_else(|| FuelError::NotFound(format!("Delivery order not found: {}", id)))
    }

    pub async fn list_delivery_orders(
        &self,
        filter: &DeliveryOrderFilter,
    ) -> FuelResult<Vec<DeliveryOrder>> {
        self.store.list_delivery_orders(filter).await
    }

    // ---- fuel records ----

    #[tracing::instrument(skip(self, input), fields(truck_no = %input.truck_no, going_do = %input.going_do))]
    pub async fn create_record(
        &self,
        input: NewFuelRecord,
        created_by: &str,
    ) -> FuelResult<FuelRecord> {
        for (field, value) in [
            ("truck_no", &input.truck_no),
            ("going_do", &input.going_do),
            ("route_from", &input.route_from),
            ("route_to", &input.route_to),
        ] {
            if value.trim().is_empty() {
                return Err(FuelError::validation(field, format!("{} is required", field)));
            }
        }

        let truck_key = normalize_truck(&input.truck_no);
        if self
            .store
            .find_record_by_do(&truck_key, &input.going_do)
            .await?
            .is_some()
        {
            return Err(FuelError::Conflict(format!(
                "Truck {} already has a fuel record for DO {}",
                input.truck_no, input.going_do
            )));
        }

        let mut record = FuelRecord::new(
            &input.truck_no,
            &input.going_do,
            &input.route_from,
            &input.route_to,
            input.date,
            created_by,
        );
        for (column, litres) in &input.yard {
            if column.kind() != ColumnKind::Yard || *litres < Decimal::ZERO {
                return Err(FuelError::validation(
                    "yard",
                    format!("{} must be a yard column with a non-negative allocation", column),
                ));
            }
            record.set_column(*column, *litres);
        }
        if let Some(extra) = input.extra {
            record.set_extra(extra);
        }

        let mut committed = self
            .commit(UnitOfWork {
                new_records: vec![record],
                ..Default::default()
            })
            .await?;
        committed
            .new_records
            .pop()
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed record missing")))
    }

    pub async fn get_record(&self, id: &str) -> FuelResult<FuelRecord> {
        self.store
            .find_record(id)
            .await?
            .filter(|r| !r.is_deleted)
            .ok_or_else(|| FuelError::NotFound(format!("Fuel record not found: {}", id)))
    }

    pub async fn list_records(&self, filter: &RecordFilter) -> FuelResult<Vec<FuelRecord>> {
        self.store.list_records(filter).await
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_columns(&self, id: &str, update: ColumnUpdate) -> FuelResult<FuelRecord> {
        let mut record = self.get_record(id).await?;
        if let Some(expected) = update.expected_version {
            if expected != record.version {
                return Err(FuelError::Conflict(format!(
                    "Fuel record {} is at version {}, not {}",
                    id, record.version, expected
                )));
            }
        }

        for (column, value) in &update.columns {
            let wrong_sign = match column.kind() {
                ColumnKind::Yard => *value < Decimal::ZERO,
                ColumnKind::Going | ColumnKind::Returning => *value > Decimal::ZERO,
            };
            if wrong_sign {
                return Err(FuelError::validation(
                    "columns",
                    format!(
                        "{} must be {}",
                        column,
                        if column.kind() == ColumnKind::Yard {
                            "zero or positive"
                        } else {
                            "zero or negative"
                        }
                    ),
                ));
            }
            record.set_column(*column, *value);
        }
        if let Some(extra) = update.extra {
            record.set_extra(extra);
        }

        let mut committed = self
            .commit(UnitOfWork {
                updated_records: vec![record],
                ..Default::default()
            })
            .await?;
        let record = committed
            .updated_records
            .pop()
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed record missing")))?;
        tracing::info!(fuel_record_id = %record.id, balance = %record.balance, "Ledger columns edited");
        Ok(record)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_record(&self, id: &str) -> FuelResult<()> {
        let mut record = self.get_record(id).await?;
        record.soft_delete(Utc::now());
        self.commit(UnitOfWork {
            updated_records: vec![record],
            ..Default::default()
        })
        .await?;
        tracing::info!(fuel_record_id = %id, "Fuel record soft-deleted");
        Ok(())
    }

    pub async fn record_extra_fuel(&self, id: &str) -> FuelResult<Vec<ExtraFuelFlag>> {
        let record = self.get_record(id).await?;
        Ok(detect_extra_fuel(&record, &self.standards))
    }

    /// Record a `RecordLookup` points at, if any.
    pub(crate) async fn lookup_record(&self, lookup: &RecordLookup) -> FuelResult<Option<FuelRecord>> {
        match lookup {
            RecordLookup::None => Ok(None),
            RecordLookup::ByDo { truck_key, do_no } => {
                self.store.find_record_by_do(truck_key, do_no).await
            }
            RecordLookup::LatestForTruck { truck_key } => {
                self.store.latest_record_for_truck(truck_key).await
            }
        }
    }

    // ---- LPOs ----

    #[tracing::instrument(
        skip(self, input),
        fields(lpo_no = %input.lpo_no, truck_no = %input.truck_no, payment_mode = %input.payment_mode)
    )]
    pub async fn create_lpo(&self, input: NewLpo) -> FuelResult<LpoPlan> {
        let command = LpoCommand::new(input)?;

        let snapshot = self.snapshot().await?;
        let record = self.lookup_record(&command.record_lookup()).await?;
        let candidates = if command.needs_candidates() {
            self.store.open_lpos_for_truck(&command.truck_key()).await?
        } else {
            Vec::new()
        };
        let mut linked_accounts = Vec::new();
        for id in command.linked_account_ids(&candidates, &snapshot) {
            if let Some(account) = self.store.find_driver_account(&id).await? {
                linked_accounts.push(account);
            }
        }
        let related_ids = command.related_record_ids(
            &candidates,
            &snapshot,
            &linked_accounts,
            record.as_ref(),
        );
        let related = self.store.find_records(&related_ids).await?;

        let plan = command.plan(
            &snapshot,
            record,
            &candidates,
            related,
            linked_accounts,
            Utc::now(),
        )?;

        let committed = self
            .commit(UnitOfWork {
                new_lpos: vec![plan.entry],
                updated_lpos: plan.cancelled,
                updated_records: plan.records,
                new_driver_accounts: plan.driver_account.into_iter().collect(),
                updated_driver_accounts: plan.released_accounts,
                ..Default::default()
            })
            .await?;

        let UnitOfWork {
            mut new_lpos,
            updated_lpos: cancelled,
            updated_records: records,
            mut new_driver_accounts,
            updated_driver_accounts: released_accounts,
            ..
        } = committed;
        let entry = new_lpos
            .pop()
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed LPO missing")))?;

        metrics::record_lpo_created(entry.payment_mode.as_str());
        if !cancelled.is_empty() {
            metrics::record_auto_cancelled(cancelled.len());
            for stale in &cancelled {
                tracing::info!(
                    cancelled_lpo_id = %stale.id,
                    cancelled_lpo_no = %stale.lpo_no,
                    station = %stale.station,
                    superseded_by = %entry.id,
                    "Stale LPO auto-cancelled by cash entry"
                );
            }
        }
        for account in &released_accounts {
            tracing::info!(
                driver_account_id = %account.id,
                superseded_by = %entry.id,
                "Driver account entry released with its cancelled LPO"
            );
        }
        tracing::info!(
            lpo_id = %entry.id,
            column = ?entry.column,
            fuel_record_id = ?entry.fuel_record_id,
            "LPO created"
        );

        Ok(LpoPlan {
            entry,
            cancelled,
            records,
            driver_account: new_driver_accounts.pop(),
            released_accounts,
        })
    }

    pub async fn get_lpo(&self, id: &str) -> FuelResult<LpoEntry> {
        self.store
            .find_lpo(id)
            .await?
            .filter(|l| !l.is_deleted)
            .ok_or_else(|| FuelError::NotFound(format!("LPO not found: {}", id)))
    }

    pub async fn list_lpos(&self, filter: &LpoFilter) -> FuelResult<Vec<LpoEntry>> {
        self.store.list_lpos(filter).await
    }

    pub async fn export_lpos(&self, filter: &LpoFilter) -> FuelResult<Vec<LpoExportRow>> {
        Ok(self
            .store
            .list_lpos(filter)
            .await?
            .iter()
            .map(LpoEntry::export_row)
            .collect())
    }

    /// `pending -> sent -> completed`; `pending -> completed` is allowed.
    #[tracing::instrument(skip(self))]
    pub async fn update_lpo_status(
        &self,
        id: &str,
        status: LpoStatus,
        acting_user: &str,
    ) -> FuelResult<LpoEntry> {
        let mut lpo = self.get_lpo(id).await?;
        let allowed = matches!(
            (lpo.status, status),
            (LpoStatus::Pending, LpoStatus::Sent)
                | (LpoStatus::Pending, LpoStatus::Completed)
                | (LpoStatus::Sent, LpoStatus::Completed)
        );
        if status == LpoStatus::Cancelled || status == LpoStatus::Pending {
            return Err(FuelError::validation(
                "status",
                "status can only move to sent or completed; use cancel instead",
            ));
        }
        if !allowed {
            return Err(FuelError::Conflict(format!(
                "LPO {} cannot move from {} to {}",
                lpo.lpo_no, lpo.status, status
            )));
        }

        lpo.status = status;
        if status == LpoStatus::Sent {
            lpo.approved_by = Some(acting_user.to_string());
        }
        lpo.updated_at = Utc::now();

        let mut committed = self
            .commit(UnitOfWork {
                updated_lpos: vec![lpo],
                ..Default::default()
            })
            .await?;
        committed
            .updated_lpos
            .pop()
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed LPO missing")))
    }

    /// Cancel an LPO and take its litres back off the ledger.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_lpo(&self, id: &str, acting_user: &str) -> FuelResult<LpoEntry> {
        let mut lpo = self.get_lpo(id).await?;
        if lpo.status == LpoStatus::Cancelled {
            return Err(FuelError::Conflict(format!(
                "LPO {} is already cancelled",
                lpo.lpo_no
            )));
        }

        let mut work = self.release_lpo(&lpo, Utc::now()).await?;
        lpo.cancel(acting_user, Utc::now());
        work.updated_lpos.push(lpo);

        let mut committed = self.commit(work).await?;
        let lpo = committed
            .updated_lpos
            .pop()
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed LPO missing")))?;
        tracing::info!(lpo_id = %lpo.id, cancelled_by = %acting_user, "LPO cancelled");
        Ok(lpo)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_lpo(&self, id: &str) -> FuelResult<()> {
        let mut lpo = self.get_lpo(id).await?;
        let now = Utc::now();
        let mut work = if lpo.is_open() {
            self.release_lpo(&lpo, now).await?
        } else {
            UnitOfWork::default()
        };
        lpo.soft_delete(now);
        work.updated_lpos.push(lpo);

        self.commit(work).await?;
        tracing::info!(lpo_id = %id, "LPO soft-deleted");
        Ok(())
    }

    /// Writes that undo an open LPO's effect on the ledger: its own booking,
    /// and for driver-account LPOs the pending account entry.
    async fn release_lpo(
        &self,
        lpo: &LpoEntry,
        now: chrono::DateTime<Utc>,
    ) -> FuelResult<UnitOfWork> {
        let mut work = UnitOfWork::default();
        if let Some((record_id, column, litres)) = lpo.booking() {
            match self
                .store
                .find_record(record_id)
                .await?
                .filter(|r| !r.is_deleted)
            {
                Some(mut record) => {
                    record.revert_litres(column, litres);
                    work.updated_records.push(record);
                }
                None => tracing::warn!(
                    lpo_id = %lpo.id,
                    fuel_record_id = %record_id,
                    "Booked fuel record is missing; nothing to revert"
                ),
            }
        }

        let linked = match (&lpo.payment_mode, &lpo.driver_account_id) {
            (PaymentMode::DriverAccount, Some(account_id)) => self
                .store
                .find_driver_account(account_id)
                .await?
                .filter(|a| !a.is_deleted),
            _ => None,
        };
        if let Some(mut account) = linked {
            if account.status != DriverAccountStatus::Pending {
                return Err(FuelError::Conflict(format!(
                    "Driver account entry {} is already {}",
                    account.id, account.status
                )));
            }
            if let Some((record_id, _, _)) = account.booking() {
                let record_id = record_id.to_string();
                if !work.updated_records.iter().any(|r| r.id == record_id) {
                    let booked = self.store.find_record(&record_id).await?;
                    if let Some(record) = booked.filter(|r| !r.is_deleted) {
                        work.updated_records.push(record);
                    }
                }
                for record in work.updated_records.iter_mut() {
                    release_booking(&account, record);
                }
            }
            account.soft_delete(now);
            work.updated_driver_accounts.push(account);
        }

        Ok(work)
    }

    // ---- reports ----

    pub async fn route_report(&self, filter: &RecordFilter) -> FuelResult<Vec<RouteTotal>> {
        Ok(route_totals(&self.store.list_records(filter).await?))
    }

    pub async fn truck_report(&self, filter: &RecordFilter) -> FuelResult<Vec<TruckEfficiency>> {
        Ok(truck_efficiency(
            &self.store.list_records(filter).await?,
            &self.bands,
        ))
    }

    pub async fn station_report(&self, filter: &LpoFilter) -> FuelResult<Vec<StationCost>> {
        Ok(station_costs(&self.store.list_lpos(filter).await?))
    }

    pub async fn extra_fuel_report(
        &self,
        filter: &RecordFilter,
    ) -> FuelResult<Vec<RecordExtraFuel>> {
        Ok(extra_fuel_report(
            &self.store.list_records(filter).await?,
            &self.standards,
        ))
    }
}

fn ensure_leg(
    checkpoint: Option<FixedCheckpoint>,
    direction: Direction,
    field: &'static str,
) -> FuelResult<()> {
    match checkpoint {
        Some(cp) if cp.direction() != direction => Err(FuelError::validation(
            field,
            format!("{} is not a {} checkpoint", cp, direction),
        )),
        _ => Ok(()),
    }
}

fn ensure_rate(rate: Option<Decimal>) -> FuelResult<()> {
    match rate {
        Some(rate) if rate < Decimal::ZERO => Err(FuelError::validation(
            "default_rate",
            "rate cannot be negative",
        )),
        _ => Ok(()),
    }
}
