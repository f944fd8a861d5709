pub mod driver_accounts;
pub mod fuel;
pub mod memory;
pub mod metrics;
pub mod mongo;
pub mod store;

pub use driver_accounts::{DriverAccountUpdate, NewDriverAccount};
pub use fuel::{
    ColumnUpdate, DeliveryOrderOutcome, FuelService, NewDeliveryOrder, NewFuelRecord, NewStation,
    StationUpdate,
};
pub use memory::InMemoryFuelStore;
pub use mongo::MongoFuelStore;
pub use store::{
    DeliveryOrderFilter, DriverAccountFilter, FuelStore, LpoFilter, RecordFilter, UnitOfWork,
};
