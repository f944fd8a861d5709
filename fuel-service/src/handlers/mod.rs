pub mod delivery_orders;
pub mod driver_accounts;
pub mod fuel_records;
pub mod health;
pub mod lpos;
pub mod reports;
pub mod stations;

pub use delivery_orders::{create_delivery_order, get_delivery_order, list_delivery_orders};
pub use driver_accounts::{
    create_driver_account, delete_driver_account, dispute_driver_account,
    export_driver_accounts, get_driver_account, list_driver_accounts, settle_driver_account,
    update_driver_account,
};
pub use fuel_records::{
    create_fuel_record, delete_fuel_record, get_fuel_record, get_record_extra_fuel,
    list_fuel_records, update_record_columns,
};
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use lpos::{
    cancel_lpo, create_lpo, delete_lpo, export_lpos, get_lpo, list_lpos, update_lpo_status,
};
pub use reports::{extra_fuel_report, route_report, station_report, truck_report};
pub use stations::{create_station, list_stations, update_station};
