use super::fuel::FuelService;
use super::metrics;
use super::store::{DriverAccountFilter, UnitOfWork};
use crate::domain::settlement::{self, rebook, release_booking};
use crate::domain::{
    apply_driver_account_to_ledger, resolve, FuelError, FuelResult, RecordLookup,
    SettlementPlan,
};
use crate::models::{
    normalize_truck, CancellationPoint, DriverAccountEntry, DriverAccountExportRow,
    DriverAccountStatus, FuelRecord,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct NewDriverAccount {
    pub date: NaiveDate,
    pub truck_no: String,
    pub driver_name: Option<String>,
    pub lpo_no: String,
    pub station: String,
    pub litres: Decimal,
    pub rate: Decimal,
    pub cancellation_point: Option<CancellationPoint>,
    pub reference_do: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DriverAccountUpdate {
    pub date: Option<NaiveDate>,
    pub driver_name: Option<String>,
    pub station: Option<String>,
    pub litres: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub notes: Option<String>,
}

impl FuelService {
    /// Record that the driver paid for fuel personally. Only a named
    /// cancellation point puts the litres on a fuel record.
    #[tracing::instrument(skip(self, input), fields(truck_no = %input.truck_no, lpo_no = %input.lpo_no))]
    pub async fn create_driver_account(
        &self,
        input: NewDriverAccount,
        created_by: &str,
    ) -> FuelResult<SettlementPlan> {
        let checkpoint = input.cancellation_point.as_ref().map(resolve).transpose()?;
        for (field, value) in [
            ("truck_no", &input.truck_no),
            ("lpo_no", &input.lpo_no),
            ("station", &input.station),
        ] {
            if value.trim().is_empty() {
                return Err(FuelError::validation(field, format!("{} is required", field)));
            }
        }
        if input.litres <= Decimal::ZERO {
            return Err(FuelError::validation("litres", "litres must be positive"));
        }
        if input.rate < Decimal::ZERO {
            return Err(FuelError::validation("rate", "rate cannot be negative"));
        }

        let mut entry = DriverAccountEntry::new(
            input.date,
            &input.truck_no,
            &input.lpo_no,
            &input.station,
            input.litres,
            input.rate,
            created_by,
        );
        entry.driver_name = input.driver_name;
        entry.notes = input.notes;
        entry.cancellation_point = input.cancellation_point;
        entry.reference_do = input.reference_do.map(|d| d.trim().to_uppercase());

        let plan = match checkpoint {
            Some(checkpoint) => {
                let record = self.record_for_entry(&entry).await?;
                apply_driver_account_to_ledger(entry, checkpoint, record)?
            }
            None => SettlementPlan {
                entry,
                record: None,
            },
        };

        let mut committed = self
            .commit(UnitOfWork {
                new_driver_accounts: vec![plan.entry],
                updated_records: plan.record.into_iter().collect(),
                ..Default::default()
            })
            .await?;
        let entry = committed
            .new_driver_accounts
            .pop()
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed entry missing")))?;
        tracing::info!(
            driver_account_id = %entry.id,
            ledger_column = ?entry.ledger_column,
            "Driver account entry created"
        );
        Ok(SettlementPlan {
            entry,
            record: committed.updated_records.pop(),
        })
    }

    pub async fn get_driver_account(&self, id: &str) -> FuelResult<DriverAccountEntry> {
        self.store
            .find_driver_account(id)
            .await?
            .filter(|e| !e.is_deleted)
            .ok_or_else(|| FuelError::NotFound(format!("Driver account entry not found: {}", id)))
    }

    pub async fn list_driver_accounts(
        &self,
        filter: &DriverAccountFilter,
    ) -> FuelResult<Vec<DriverAccountEntry>> {
        self.store.list_driver_accounts(filter).await
    }

    /// Rows for the monthly driver-account sheet. DO and destination are
    /// always `NIL`.
    pub async fn export_driver_accounts(
        &self,
        filter: &DriverAccountFilter,
    ) -> FuelResult<Vec<DriverAccountExportRow>> {
        Ok(self
            .store
            .list_driver_accounts(filter)
            .await?
            .iter()
            .map(DriverAccountEntry::export_row)
            .collect())
    }

    /// Edit a pending entry. A booked entry moves its litres on the record
    /// with it, and an open linked LPO is kept in step.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_driver_account(
        &self,
        id: &str,
        update: DriverAccountUpdate,
    ) -> FuelResult<DriverAccountEntry> {
        let mut entry = self.get_driver_account(id).await?;
        if entry.status != DriverAccountStatus::Pending {
            return Err(FuelError::Conflict(format!(
                "Driver account entry {} is {} and can no longer be edited",
                entry.id, entry.status
            )));
        }
        if update.litres.is_some_and(|l| l <= Decimal::ZERO) {
            return Err(FuelError::validation("litres", "litres must be positive"));
        }
        if update.rate.is_some_and(|r| r < Decimal::ZERO) {
            return Err(FuelError::validation("rate", "rate cannot be negative"));
        }

        let previous_litres = entry.litres;
        if let Some(date) = update.date {
            entry.set_date(date);
        }
        if let Some(name) = update.driver_name {
            entry.driver_name = Some(name);
        }
        if let Some(station) = update.station {
            entry.station = station.trim().to_string();
        }
        if let Some(notes) = update.notes {
            entry.notes = Some(notes);
        }
        if let Some(litres) = update.litres {
            entry.litres = litres;
        }
        if let Some(rate) = update.rate {
            entry.rate = rate;
        }
        entry.recompute_amount();

        let mut work = UnitOfWork::default();
        if let Some((record_id, _, _)) = entry.booking() {
            if entry.litres != previous_litres {
                if let Some(mut record) = self.store.find_record(record_id).await? {
                    rebook(&entry, previous_litres, &mut record);
                    work.updated_records.push(record);
                }
            }
        }
        if let Some(lpo_id) = &entry.lpo_id {
            if let Some(mut lpo) = self.store.find_lpo(lpo_id).await?.filter(|l| l.is_open()) {
                lpo.litres = entry.litres;
                lpo.rate = entry.rate;
                lpo.amount = entry.amount;
                lpo.station = entry.station.clone();
                lpo.updated_at = entry.updated_at;
                work.updated_lpos.push(lpo);
            }
        }
        work.updated_driver_accounts.push(entry);

        let mut committed = self.commit(work).await?;
        committed
            .updated_driver_accounts
            .pop()
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed entry missing")))
    }

    /// `pending -> settled`. With a cancellation point the litres are booked
    /// on the truck's record in the same commit.
    #[tracing::instrument(skip(self, point))]
    pub async fn settle_driver_account(
        &self,
        id: &str,
        settled_by: &str,
        point: Option<CancellationPoint>,
    ) -> FuelResult<SettlementPlan> {
        let checkpoint = point.as_ref().map(resolve).transpose()?;
        let mut entry = self.get_driver_account(id).await?;
        if point.is_some() {
            entry.cancellation_point = point;
        }

        let record = match &checkpoint {
            Some(_) => Some(self.record_for_entry(&entry).await?),
            None => None,
        };
        let plan = settlement::settle(entry, settled_by, checkpoint, record, Utc::now())?;

        let mut committed = self
            .commit(UnitOfWork {
                updated_driver_accounts: vec![plan.entry],
                updated_records: plan.record.into_iter().collect(),
                ..Default::default()
            })
            .await?;
        let entry = committed
            .updated_driver_accounts
            .pop()
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed entry missing")))?;

        metrics::record_driver_account_closed(entry.status.as_str());
        tracing::info!(driver_account_id = %entry.id, settled_by = %settled_by, "Driver account settled");
        Ok(SettlementPlan {
            entry,
            record: committed.updated_records.pop(),
        })
    }

    #[tracing::instrument(skip(self, reason))]
    pub async fn dispute_driver_account(
        &self,
        id: &str,
        disputed_by: &str,
        reason: Option<String>,
    ) -> FuelResult<DriverAccountEntry> {
        let mut entry = self.get_driver_account(id).await?;
        entry.dispute(disputed_by, reason, Utc::now())?;

        let mut committed = self
            .commit(UnitOfWork {
                updated_driver_accounts: vec![entry],
                ..Default::default()
            })
            .await?;
        let entry = committed
            .updated_driver_accounts
            .pop()
            .ok_or_else(|| FuelError::Store(anyhow::anyhow!("Committed entry missing")))?;

        metrics::record_driver_account_closed(entry.status.as_str());
        tracing::info!(driver_account_id = %entry.id, "Driver account disputed");
        Ok(entry)
    }

    /// Soft delete. Booked litres come back off the record and an open
    /// linked LPO is cancelled with it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_driver_account(&self, id: &str, deleted_by: &str) -> FuelResult<()> {
        let mut entry = self.get_driver_account(id).await?;
        let now = Utc::now();

        let mut work = UnitOfWork::default();
        if let Some((record_id, _, _)) = entry.booking() {
            if let Some(mut record) = self.store.find_record(record_id).await? {
                release_booking(&entry, &mut record);
                work.updated_records.push(record);
            }
        }
        if let Some(lpo_id) = &entry.lpo_id {
            if let Some(mut lpo) = self.store.find_lpo(lpo_id).await?.filter(|l| l.is_open()) {
                lpo.cancel(deleted_by, now);
                work.updated_lpos.push(lpo);
            }
        }
        entry.soft_delete(now);
        work.updated_driver_accounts.push(entry);

        self.commit(work).await?;
        tracing::info!(driver_account_id = %id, "Driver account entry soft-deleted");
        Ok(())
    }

    /// The record a driver-account booking lands on: the one carrying the
    /// entry's reference DO, else the truck's latest.
    async fn record_for_entry(&self, entry: &DriverAccountEntry) -> FuelResult<FuelRecord> {
        let truck_key = normalize_truck(&entry.truck_no);
        let lookup = match &entry.reference_do {
            Some(do_no) => RecordLookup::ByDo {
                truck_key,
                do_no: do_no.clone(),
            },
            None => RecordLookup::LatestForTruck { truck_key },
        };
        self.lookup_record(&lookup).await?.ok_or_else(|| {
            FuelError::NotFound(format!("No active fuel record for truck {}", entry.truck_no))
        })
    }
}

