//! Persistence seam for the fuel ledger.

use crate::domain::FuelResult;
use crate::models::{
    DeliveryOrder, DriverAccountEntry, DriverAccountStatus, FuelRecord, ImportExport, LpoEntry,
    LpoStatus, PaymentMode, StationConfig,
};
use async_trait::async_trait;
use chrono::NaiveDate;

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub truck_key: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_deleted: bool,
}

impl RecordFilter {
    pub fn matches(&self, record: &FuelRecord) -> bool {
        (self.include_deleted || !record.is_deleted)
            && self.truck_key.as_ref().map_or(true, |t| &record.truck_key == t)
            && in_range(record.date, self.from, self.to)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LpoFilter {
    pub truck_key: Option<String>,
    pub station: Option<String>,
    pub status: Option<LpoStatus>,
    pub payment_mode: Option<PaymentMode>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_deleted: bool,
}

impl LpoFilter {
    pub fn matches(&self, lpo: &LpoEntry) -> bool {
        (self.include_deleted || !lpo.is_deleted)
            && self.truck_key.as_ref().map_or(true, |t| &lpo.truck_key == t)
            && self
                .station
                .as_ref()
                .map_or(true, |s| lpo.station.eq_ignore_ascii_case(s))
            && self.status.map_or(true, |s| lpo.status == s)
            && self.payment_mode.map_or(true, |m| lpo.payment_mode == m)
            && in_range(lpo.date, self.from, self.to)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverAccountFilter {
    pub truck_key: Option<String>,
    pub status: Option<DriverAccountStatus>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub include_deleted: bool,
}

impl DriverAccountFilter {
    pub fn matches(&self, entry: &DriverAccountEntry) -> bool {
        (self.include_deleted || !entry.is_deleted)
            && self.truck_key.as_ref().map_or(true, |t| &entry.truck_key == t)
            && self.status.map_or(true, |s| entry.status == s)
            && self.month.map_or(true, |m| entry.month == m)
            && self.year.map_or(true, |y| entry.year == y)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryOrderFilter {
    pub truck_key: Option<String>,
    pub import_export: Option<ImportExport>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DeliveryOrderFilter {
    pub fn matches(&self, order: &DeliveryOrder) -> bool {
        !order.is_deleted
            && self.truck_key.as_ref().map_or(true, |t| &order.truck_key == t)
            && self.import_export.map_or(true, |d| order.import_export == d)
            && in_range(order.date, self.from, self.to)
    }
}

fn in_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}

/// Documents written together or not at all.
///
/// `updated_*` documents carry the version they were read at; the store
/// rejects the whole unit with a conflict if any stored version moved on.
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
    pub new_lpos: Vec<LpoEntry>,
    pub updated_lpos: Vec<LpoEntry>,
    pub new_records: Vec<FuelRecord>,
    pub updated_records: Vec<FuelRecord>,
    pub new_driver_accounts: Vec<DriverAccountEntry>,
    pub updated_driver_accounts: Vec<DriverAccountEntry>,
    pub new_delivery_orders: Vec<DeliveryOrder>,
}

impl UnitOfWork {
    pub fn is_empty(&self) -> bool {
        self.new_lpos.is_empty()
            && self.updated_lpos.is_empty()
            && self.new_records.is_empty()
            && self.updated_records.is_empty()
            && self.new_driver_accounts.is_empty()
            && self.updated_driver_accounts.is_empty()
            && self.new_delivery_orders.is_empty()
    }

    /// Versions as stored once the unit has been committed.
    pub(crate) fn into_committed(mut self) -> Self {
        use crate::models::Versioned;
        self.updated_lpos.iter_mut().for_each(Versioned::bump_version);
        self.updated_records.iter_mut().for_each(Versioned::bump_version);
        self.updated_driver_accounts
            .iter_mut()
            .for_each(Versioned::bump_version);
        self
    }
}

#[async_trait]
pub trait FuelStore: Send + Sync {
    async fn health_check(&self) -> FuelResult<()>;

    async fn insert_station(&self, station: &StationConfig) -> FuelResult<()>;
    async fn find_station(&self, key: &str) -> FuelResult<Option<StationConfig>>;
    async fn list_stations(&self) -> FuelResult<Vec<StationConfig>>;
    async fn replace_station(&self, station: &StationConfig) -> FuelResult<()>;

    async fn find_delivery_order(&self, id: &str) -> FuelResult<Option<DeliveryOrder>>;
    async fn find_delivery_order_by_no(&self, do_no: &str) -> FuelResult<Option<DeliveryOrder>>;
    async fn list_delivery_orders(
        &self,
        filter: &DeliveryOrderFilter,
    ) -> FuelResult<Vec<DeliveryOrder>>;

    /// Soft-deleted records are returned too.
    async fn find_record(&self, id: &str) -> FuelResult<Option<FuelRecord>>;
    /// Active record whose going or return DO is `do_no`.
    async fn find_record_by_do(&self, truck_key: &str, do_no: &str)
        -> FuelResult<Option<FuelRecord>>;
    async fn latest_record_for_truck(&self, truck_key: &str) -> FuelResult<Option<FuelRecord>>;
    /// Latest active record still waiting for its return DO.
    async fn record_awaiting_return(&self, truck_key: &str) -> FuelResult<Option<FuelRecord>>;
    /// Active records among `ids`; soft-deleted ones are skipped.
    async fn find_records(&self, ids: &[String]) -> FuelResult<Vec<FuelRecord>>;
    async fn list_records(&self, filter: &RecordFilter) -> FuelResult<Vec<FuelRecord>>;

    async fn find_lpo(&self, id: &str) -> FuelResult<Option<LpoEntry>>;
    /// Not cancelled and not deleted.
    async fn open_lpos_for_truck(&self, truck_key: &str) -> FuelResult<Vec<LpoEntry>>;
    async fn list_lpos(&self, filter: &LpoFilter) -> FuelResult<Vec<LpoEntry>>;

    async fn find_driver_account(&self, id: &str) -> FuelResult<Option<DriverAccountEntry>>;
    async fn list_driver_accounts(
        &self,
        filter: &DriverAccountFilter,
    ) -> FuelResult<Vec<DriverAccountEntry>>;

    /// Apply every write in `work` atomically. Returns the unit with the
    /// versions now stored.
    async fn commit(&self, work: UnitOfWork) -> FuelResult<UnitOfWork>;
}
