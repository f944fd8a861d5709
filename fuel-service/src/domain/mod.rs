//! Ledger rules: checkpoint resolution, auto-cancellation, settlement and
//! the read-only analytics built on top of them. Nothing in here touches
//! the store; callers load inputs, run a command and commit its plan.

pub mod error;
pub mod extra_fuel;
pub mod lpo_command;
pub mod matcher;
pub mod reports;
pub mod resolver;
pub mod settlement;

pub use error::{FuelError, FuelResult};
pub use extra_fuel::{detect_extra_fuel, ExtraFuelFlag, ExtraFuelStandards};
pub use lpo_command::{LpoCommand, LpoPlan, NewLpo, RecordLookup};
pub use matcher::find_cancellation_targets;
pub use reports::{
    extra_fuel_report, route_totals, station_costs, truck_efficiency, EfficiencyBand,
    EfficiencyBands, RecordExtraFuel, RouteTotal, StationCost, TruckEfficiency,
};
pub use resolver::{resolve, resolve_for_lpo, StationSnapshot};
pub use settlement::{apply_driver_account_to_ledger, SettlementPlan};
