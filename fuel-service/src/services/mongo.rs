use super::store::{
    DeliveryOrderFilter, DriverAccountFilter, FuelStore, LpoFilter, RecordFilter, UnitOfWork,
};
use crate::domain::{FuelError, FuelResult};
use crate::models::{
    DeliveryOrder, DriverAccountEntry, FuelRecord, LpoEntry, LpoStatus, StationConfig, Versioned,
};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Document},
    error::{ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR},
    options::{FindOneOptions, FindOptions, IndexOptions},
    Client as MongoClient, ClientSession, Collection, Database, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use service_core::error::AppError;

const DUPLICATE_KEY: i32 = 11000;
const WRITE_CONFLICT: i32 = 112;

#[derive(Clone)]
pub struct MongoFuelStore {
    client: MongoClient,
    db: Database,
}

impl MongoFuelStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for fuel-service");

        self.create_index(
            &self.delivery_orders(),
            doc! { "do_no": 1 },
            "do_no_unique",
            true,
        )
        .await?;
        self.create_index(
            &self.fuel_records(),
            doc! { "truck_key": 1, "is_deleted": 1, "date": -1 },
            "truck_journeys",
            false,
        )
        .await?;
        self.create_index(
            &self.fuel_records(),
            doc! { "going_do": 1 },
            "going_do_lookup",
            false,
        )
        .await?;
        self.create_index(
            &self.fuel_records(),
            doc! { "return_do": 1 },
            "return_do_lookup",
            false,
        )
        .await?;
        // Auto-cancellation scans open rows per truck.
        self.create_index(
            &self.lpo_entries(),
            doc! { "truck_key": 1, "status": 1, "is_deleted": 1 },
            "open_lpos_by_truck",
            false,
        )
        .await?;
        self.create_index(
            &self.lpo_entries(),
            doc! { "station": 1, "date": -1 },
            "lpos_by_station",
            false,
        )
        .await?;
        self.create_index(
            &self.driver_accounts(),
            doc! { "truck_key": 1, "year": 1, "month": 1 },
            "driver_accounts_by_period",
            false,
        )
        .await?;

        Ok(())
    }

    async fn create_index<T>(
        &self,
        collection: &Collection<T>,
        keys: Document,
        name: &str,
        unique: bool,
    ) -> Result<(), AppError>
    where
        T: Send + Sync,
    {
        let index = IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .name(name.to_string())
                    .unique(unique)
                    .build(),
            )
            .build();

        collection.create_index(index, None).await.map_err(|e| {
            tracing::error!(
                "Failed to create {} index on {} collection: {}",
                name,
                collection.name(),
                e
            );
            AppError::from(e)
        })?;
        tracing::info!("Created index {}.{}", collection.name(), name);
        Ok(())
    }

    pub fn stations(&self) -> Collection<StationConfig> {
        self.db.collection("stations")
    }

    pub fn delivery_orders(&self) -> Collection<DeliveryOrder> {
        self.db.collection("delivery_orders")
    }

    pub fn fuel_records(&self) -> Collection<FuelRecord> {
        self.db.collection("fuel_records")
    }

    pub fn lpo_entries(&self) -> Collection<LpoEntry> {
        self.db.collection("lpo_entries")
    }

    pub fn driver_accounts(&self) -> Collection<DriverAccountEntry> {
        self.db.collection("driver_accounts")
    }

    async fn apply(&self, work: &UnitOfWork, session: &mut ClientSession) -> FuelResult<()> {
        insert_all(&self.lpo_entries(), &work.new_lpos, session).await?;
        insert_all(&self.fuel_records(), &work.new_records, session).await?;
        insert_all(&self.driver_accounts(), &work.new_driver_accounts, session).await?;
        for order in &work.new_delivery_orders {
            self.delivery_orders()
                .insert_one_with_session(order, None, session)
                .await
                .map_err(|e| map_write_error(e, &format!("Delivery order {}", order.do_no)))?;
        }

        replace_all(&self.lpo_entries(), &work.updated_lpos, "LPO", session).await?;
        replace_all(
            &self.fuel_records(),
            &work.updated_records,
            "Fuel record",
            session,
        )
        .await?;
        replace_all(
            &self.driver_accounts(),
            &work.updated_driver_accounts,
            "Driver account entry",
            session,
        )
        .await?;
        Ok(())
    }
}

async fn insert_all<T>(
    collection: &Collection<T>,
    docs: &[T],
    session: &mut ClientSession,
) -> FuelResult<()>
where
    T: Versioned + Serialize + Send + Sync,
{
    for doc in docs {
        collection
            .insert_one_with_session(doc, None, session)
            .await
            .map_err(|e| map_write_error(e, doc.id()))?;
    }
    Ok(())
}

/// Replace each document only if the stored version still matches.
async fn replace_all<T>(
    collection: &Collection<T>,
    docs: &[T],
    kind: &str,
    session: &mut ClientSession,
) -> FuelResult<()>
where
    T: Versioned + Serialize + Clone + Send + Sync,
{
    for doc in docs {
        let mut next = doc.clone();
        next.bump_version();
        let result = collection
            .replace_one_with_session(
                doc! { "_id": doc.id(), "version": doc.version() },
                &next,
                None,
                session,
            )
            .await
            .map_err(|e| map_write_error(e, doc.id()))?;
        if result.matched_count == 0 {
            return Err(FuelError::Conflict(format!(
                "{} {} was modified concurrently",
                kind,
                doc.id()
            )));
        }
    }
    Ok(())
}

fn map_write_error(err: mongodb::error::Error, what: &str) -> FuelError {
    let duplicate = matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    );
    let write_conflict = err.contains_label(TRANSIENT_TRANSACTION_ERROR)
        || matches!(err.kind.as_ref(), ErrorKind::Command(e) if e.code == WRITE_CONFLICT);

    if duplicate {
        FuelError::Conflict(format!("{} already exists", what))
    } else if write_conflict {
        FuelError::Conflict(format!("{} was modified concurrently", what))
    } else {
        FuelError::from(err)
    }
}

async fn collect<T>(
    collection: &Collection<T>,
    filter: Document,
    options: Option<FindOptions>,
) -> FuelResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let cursor = collection.find(filter, options).await?;
    let docs: Vec<T> = cursor.try_collect().await?;
    Ok(docs)
}

fn newest_first() -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "date": -1, "created_at": -1 })
        .build()
}

fn newest_one() -> FindOneOptions {
    FindOneOptions::builder()
        .sort(doc! { "date": -1, "created_at": -1 })
        .build()
}

fn bson_of<T: Serialize>(value: &T) -> FuelResult<mongodb::bson::Bson> {
    to_bson(value).map_err(|e| FuelError::Store(anyhow::anyhow!("Failed to encode filter: {}", e)))
}

fn date_range(filter: &mut Document, from: Option<chrono::NaiveDate>, to: Option<chrono::NaiveDate>) {
    // Dates are stored as ISO strings, which order correctly.
    let mut range = Document::new();
    if let Some(from) = from {
        range.insert("$gte", from.to_string());
    }
    if let Some(to) = to {
        range.insert("$lte", to.to_string());
    }
    if !range.is_empty() {
        filter.insert("date", range);
    }
}

fn active(include_deleted: bool) -> Document {
    if include_deleted {
        Document::new()
    } else {
        doc! { "is_deleted": { "$ne": true } }
    }
}

#[async_trait]
impl FuelStore for MongoFuelStore {
    async fn health_check(&self) -> FuelResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                FuelError::from(e)
            })?;
        Ok(())
    }

    async fn insert_station(&self, station: &StationConfig) -> FuelResult<()> {
        self.stations()
            .insert_one(station, None)
            .await
            .map_err(|e| map_write_error(e, &format!("Station {}", station.name)))?;
        Ok(())
    }

    async fn find_station(&self, key: &str) -> FuelResult<Option<StationConfig>> {
        Ok(self.stations().find_one(doc! { "_id": key }, None).await?)
    }

    async fn list_stations(&self) -> FuelResult<Vec<StationConfig>> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        collect(&self.stations(), Document::new(), Some(options)).await
    }

    async fn replace_station(&self, station: &StationConfig) -> FuelResult<()> {
        let result = self
            .stations()
            .replace_one(doc! { "_id": &station.key }, station, None)
            .await?;
        if result.matched_count == 0 {
            return Err(FuelError::NotFound(format!(
                "Station not found: {}",
                station.name
            )));
        }
        Ok(())
    }

    async fn find_delivery_order(&self, id: &str) -> FuelResult<Option<DeliveryOrder>> {
        let mut filter = active(false);
        filter.insert("_id", id);
        Ok(self.delivery_orders().find_one(filter, None).await?)
    }

    async fn find_delivery_order_by_no(&self, do_no: &str) -> FuelResult<Option<DeliveryOrder>> {
        let mut filter = active(false);
        filter.insert("do_no", do_no.trim().to_uppercase());
        Ok(self.delivery_orders().find_one(filter, None).await?)
    }

    async fn list_delivery_orders(
        &self,
        filter: &DeliveryOrderFilter,
    ) -> FuelResult<Vec<DeliveryOrder>> {
        let mut query = active(false);
        if let Some(truck_key) = &filter.truck_key {
            query.insert("truck_key", truck_key);
        }
        if let Some(import_export) = &filter.import_export {
            query.insert("import_export", bson_of(import_export)?);
        }
        date_range(&mut query, filter.from, filter.to);
        collect(&self.delivery_orders(), query, Some(newest_first())).await
    }

    async fn find_record(&self, id: &str) -> FuelResult<Option<FuelRecord>> {
        Ok(self.fuel_records().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_record_by_do(
        &self,
        truck_key: &str,
        do_no: &str,
    ) -> FuelResult<Option<FuelRecord>> {
        let do_no = do_no.trim().to_uppercase();
        let mut filter = active(false);
        filter.insert("truck_key", truck_key);
        filter.insert("$or", vec![doc! { "going_do": &do_no }, doc! { "return_do": &do_no }]);
        Ok(self.fuel_records().find_one(filter, newest_one()).await?)
    }

    async fn latest_record_for_truck(&self, truck_key: &str) -> FuelResult<Option<FuelRecord>> {
        let mut filter = active(false);
        filter.insert("truck_key", truck_key);
        Ok(self.fuel_records().find_one(filter, newest_one()).await?)
    }

    async fn record_awaiting_return(&self, truck_key: &str) -> FuelResult<Option<FuelRecord>> {
        let mut filter = active(false);
        filter.insert("truck_key", truck_key);
        filter.insert("return_do", mongodb::bson::Bson::Null);
        Ok(self.fuel_records().find_one(filter, newest_one()).await?)
    }

    async fn find_records(&self, ids: &[String]) -> FuelResult<Vec<FuelRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut filter = active(false);
        filter.insert("_id", doc! { "$in": ids.to_vec() });
        collect(&self.fuel_records(), filter, None).await
    }

    async fn list_records(&self, filter: &RecordFilter) -> FuelResult<Vec<FuelRecord>> {
        let mut query = active(filter.include_deleted);
        if let Some(truck_key) = &filter.truck_key {
            query.insert("truck_key", truck_key);
        }
        date_range(&mut query, filter.from, filter.to);
        collect(&self.fuel_records(), query, Some(newest_first())).await
    }

    async fn find_lpo(&self, id: &str) -> FuelResult<Option<LpoEntry>> {
        Ok(self.lpo_entries().find_one(doc! { "_id": id }, None).await?)
    }

    async fn open_lpos_for_truck(&self, truck_key: &str) -> FuelResult<Vec<LpoEntry>> {
        let mut filter = active(false);
        filter.insert("truck_key", truck_key);
        let cancelled = bson_of(&LpoStatus::Cancelled)?;
        filter.insert("status", doc! { "$ne": cancelled });
        collect(&self.lpo_entries(), filter, None).await
    }

    async fn list_lpos(&self, filter: &LpoFilter) -> FuelResult<Vec<LpoEntry>> {
        let mut query = active(filter.include_deleted);
        if let Some(truck_key) = &filter.truck_key {
            query.insert("truck_key", truck_key);
        }
        if let Some(station) = &filter.station {
            query.insert(
                "station",
                doc! { "$regex": format!("^{}$", regex_escape(station.trim())), "$options": "i" },
            );
        }
        if let Some(status) = &filter.status {
            query.insert("status", bson_of(status)?);
        }
        if let Some(mode) = &filter.payment_mode {
            query.insert("payment_mode", bson_of(mode)?);
        }
        date_range(&mut query, filter.from, filter.to);
        collect(&self.lpo_entries(), query, Some(newest_first())).await
    }

    async fn find_driver_account(&self, id: &str) -> FuelResult<Option<DriverAccountEntry>> {
        Ok(self
            .driver_accounts()
            .find_one(doc! { "_id": id }, None)
            .await?)
    }

    async fn list_driver_accounts(
        &self,
        filter: &DriverAccountFilter,
    ) -> FuelResult<Vec<DriverAccountEntry>> {
        let mut query = active(filter.include_deleted);
        if let Some(truck_key) = &filter.truck_key {
            query.insert("truck_key", truck_key);
        }
        if let Some(status) = &filter.status {
            query.insert("status", bson_of(status)?);
        }
        if let Some(month) = filter.month {
            query.insert("month", month as i64);
        }
        if let Some(year) = filter.year {
            query.insert("year", year);
        }
        collect(&self.driver_accounts(), query, Some(newest_first())).await
    }

    async fn commit(&self, work: UnitOfWork) -> FuelResult<UnitOfWork> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        if let Err(e) = self.apply(&work, &mut session).await {
            if let Err(abort) = session.abort_transaction().await {
                tracing::warn!("Failed to abort transaction: {}", abort);
            }
            return Err(e);
        }

        session
            .commit_transaction()
            .await
            .map_err(|e| map_write_error(e, "Transaction"))?;

        Ok(work.into_committed())
    }
}

fn regex_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
