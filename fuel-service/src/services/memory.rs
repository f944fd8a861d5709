//! Process-local store used by tests and `STORE_BACKEND=memory`.

use super::store::{
    DeliveryOrderFilter, DriverAccountFilter, FuelStore, LpoFilter, RecordFilter, UnitOfWork,
};
use crate::domain::{FuelError, FuelResult};
use crate::models::{
    DeliveryOrder, DriverAccountEntry, FuelRecord, LpoEntry, StationConfig, Versioned,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    stations: HashMap<String, StationConfig>,
    delivery_orders: HashMap<String, DeliveryOrder>,
    records: HashMap<String, FuelRecord>,
    lpos: HashMap<String, LpoEntry>,
    driver_accounts: HashMap<String, DriverAccountEntry>,
}

#[derive(Default)]
pub struct InMemoryFuelStore {
    state: Mutex<State>,
}

impl InMemoryFuelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_new<T: Versioned>(existing: &HashMap<String, T>, doc: &T, kind: &str) -> FuelResult<()> {
    if existing.contains_key(doc.id()) {
        return Err(FuelError::Conflict(format!("{} {} already exists", kind, doc.id())));
    }
    Ok(())
}

fn check_version<T: Versioned>(
    existing: &HashMap<String, T>,
    doc: &T,
    kind: &str,
) -> FuelResult<()> {
    match existing.get(doc.id()) {
        Some(stored) if stored.version() == doc.version() => Ok(()),
        Some(_) => Err(FuelError::Conflict(format!(
            "{} {} was modified concurrently",
            kind,
            doc.id()
        ))),
        None => Err(FuelError::NotFound(format!("{} not found: {}", kind, doc.id()))),
    }
}

fn write_all<T: Versioned + Clone>(
    target: &mut HashMap<String, T>,
    new_docs: &[T],
    updated_docs: &[T],
) {
    for doc in new_docs {
        target.insert(doc.id().to_string(), doc.clone());
    }
    for doc in updated_docs {
        let mut next = doc.clone();
        next.bump_version();
        target.insert(doc.id().to_string(), next);
    }
}

fn latest(records: impl Iterator<Item = FuelRecord>) -> Option<FuelRecord> {
    records.max_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.created_at.cmp(&b.created_at))
    })
}

#[async_trait]
impl FuelStore for InMemoryFuelStore {
    async fn health_check(&self) -> FuelResult<()> {
        Ok(())
    }

    async fn insert_station(&self, station: &StationConfig) -> FuelResult<()> {
        let mut state = self.state.lock().await;
        if state.stations.contains_key(&station.key) {
            return Err(FuelError::Conflict(format!(
                "Station already exists: {}",
                station.name
            )));
        }
        state.stations.insert(station.key.clone(), station.clone());
        Ok(())
    }

    async fn find_station(&self, key: &str) -> FuelResult<Option<StationConfig>> {
        Ok(self.state.lock().await.stations.get(key).cloned())
    }

    async fn list_stations(&self) -> FuelResult<Vec<StationConfig>> {
        let mut stations: Vec<_> = self.state.lock().await.stations.values().cloned().collect();
        stations.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(stations)
    }

    async fn replace_station(&self, station: &StationConfig) -> FuelResult<()> {
        let mut state = self.state.lock().await;
        match state.stations.get_mut(&station.key) {
            Some(stored) => {
                *stored = station.clone();
                Ok(())
            }
            None => Err(FuelError::NotFound(format!(
                "Station not found: {}",
                station.name
            ))),
        }
    }

    async fn find_delivery_order(&self, id: &str) -> FuelResult<Option<DeliveryOrder>> {
        Ok(self
            .state
            .lock()
            .await
            .delivery_orders
            .get(id)
            .filter(|d| !d.is_deleted)
            .cloned())
    }

    async fn find_delivery_order_by_no(&self, do_no: &str) -> FuelResult<Option<DeliveryOrder>> {
        let do_no = do_no.trim().to_uppercase();
        Ok(self
            .state
            .lock()
            .await
            .delivery_orders
            .values()
            .find(|d| !d.is_deleted && d.do_no == do_no)
            .cloned())
    }

    async fn list_delivery_orders(
        &self,
        filter: &DeliveryOrderFilter,
    ) -> FuelResult<Vec<DeliveryOrder>> {
        let mut orders: Vec<_> = self
            .state
            .lock()
            .await
            .delivery_orders
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(orders)
    }

    async fn find_record(&self, id: &str) -> FuelResult<Option<FuelRecord>> {
        Ok(self.state.lock().await.records.get(id).cloned())
    }

    async fn find_record_by_do(
        &self,
        truck_key: &str,
        do_no: &str,
    ) -> FuelResult<Option<FuelRecord>> {
        let state = self.state.lock().await;
        Ok(latest(
            state
                .records
                .values()
                .filter(|r| !r.is_deleted && r.truck_key == truck_key && r.leg_of(do_no).is_some())
                .cloned(),
        ))
    }

    async fn latest_record_for_truck(&self, truck_key: &str) -> FuelResult<Option<FuelRecord>> {
        let state = self.state.lock().await;
        Ok(latest(
            state
                .records
                .values()
                .filter(|r| !r.is_deleted && r.truck_key == truck_key)
                .cloned(),
        ))
    }

    async fn record_awaiting_return(&self, truck_key: &str) -> FuelResult<Option<FuelRecord>> {
        let state = self.state.lock().await;
        Ok(latest(
            state
                .records
                .values()
                .filter(|r| !r.is_deleted && r.truck_key == truck_key && r.return_do.is_none())
                .cloned(),
        ))
    }

    async fn find_records(&self, ids: &[String]) -> FuelResult<Vec<FuelRecord>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.records.get(id))
            .filter(|r| !r.is_deleted)
            .cloned()
            .collect())
    }

    async fn list_records(&self, filter: &RecordFilter) -> FuelResult<Vec<FuelRecord>> {
        let mut records: Vec<_> = self
            .state
            .lock()
            .await
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(records)
    }

    async fn find_lpo(&self, id: &str) -> FuelResult<Option<LpoEntry>> {
        Ok(self.state.lock().await.lpos.get(id).cloned())
    }

    async fn open_lpos_for_truck(&self, truck_key: &str) -> FuelResult<Vec<LpoEntry>> {
        Ok(self
            .state
            .lock()
            .await
            .lpos
            .values()
            .filter(|l| l.is_open() && l.truck_key == truck_key)
            .cloned()
            .collect())
    }

    async fn list_lpos(&self, filter: &LpoFilter) -> FuelResult<Vec<LpoEntry>> {
        let mut lpos: Vec<_> = self
            .state
            .lock()
            .await
            .lpos
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        lpos.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(lpos)
    }

    async fn find_driver_account(&self, id: &str) -> FuelResult<Option<DriverAccountEntry>> {
        Ok(self.state.lock().await.driver_accounts.get(id).cloned())
    }

    async fn list_driver_accounts(
        &self,
        filter: &DriverAccountFilter,
    ) -> FuelResult<Vec<DriverAccountEntry>> {
        let mut entries: Vec<_> = self
            .state
            .lock()
            .await
            .driver_accounts
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(entries)
    }

    async fn commit(&self, work: UnitOfWork) -> FuelResult<UnitOfWork> {
        let mut state = self.state.lock().await;

        // Validate everything before the first write.
        for lpo in &work.new_lpos {
            check_new(&state.lpos, lpo, "LPO")?;
        }
        for lpo in &work.updated_lpos {
            check_version(&state.lpos, lpo, "LPO")?;
        }
        for record in &work.new_records {
            check_new(&state.records, record, "Fuel record")?;
        }
        for record in &work.updated_records {
            check_version(&state.records, record, "Fuel record")?;
        }
        for entry in &work.new_driver_accounts {
            check_new(&state.driver_accounts, entry, "Driver account entry")?;
        }
        for entry in &work.updated_driver_accounts {
            check_version(&state.driver_accounts, entry, "Driver account entry")?;
        }
        for order in &work.new_delivery_orders {
            let duplicate = state
                .delivery_orders
                .values()
                .any(|d| !d.is_deleted && d.do_no == order.do_no);
            if duplicate {
                return Err(FuelError::Conflict(format!(
                    "Delivery order already exists: {}",
                    order.do_no
                )));
            }
        }

        write_all(&mut state.lpos, &work.new_lpos, &work.updated_lpos);
        write_all(&mut state.records, &work.new_records, &work.updated_records);
        write_all(
            &mut state.driver_accounts,
            &work.new_driver_accounts,
            &work.updated_driver_accounts,
        );
        for order in &work.new_delivery_orders {
            state.delivery_orders.insert(order.id.clone(), order.clone());
        }

        Ok(work.into_committed())
    }
}
