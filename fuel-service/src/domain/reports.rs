//! Read-only aggregations over records and LPOs.

use super::extra_fuel::{detect_extra_fuel, ExtraFuelFlag, ExtraFuelStandards};
use crate::models::{FuelRecord, LpoEntry, LpoStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTotal {
    pub route_from: String,
    pub route_to: String,
    pub trips: u64,
    pub allocated: Decimal,
    pub consumed: Decimal,
    pub balance: Decimal,
}

pub fn route_totals(records: &[FuelRecord]) -> Vec<RouteTotal> {
    let mut routes: BTreeMap<(String, String), RouteTotal> = BTreeMap::new();

    for record in records.iter().filter(|r| !r.is_deleted) {
        let key = (
            record.route_from.to_uppercase(),
            record.route_to.to_uppercase(),
        );
        let total = routes.entry(key).or_insert_with(|| RouteTotal {
            route_from: record.route_from.clone(),
            route_to: record.route_to.clone(),
            trips: 0,
            allocated: Decimal::ZERO,
            consumed: Decimal::ZERO,
            balance: Decimal::ZERO,
        });
        total.trips += 1;
        total.allocated += record.allocated();
        total.consumed += record.consumed();
        total.balance += record.balance;
    }

    routes.into_values().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyBand {
    Efficient,
    Normal,
    High,
}

/// Average-litres-per-trip thresholds, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyBands {
    pub efficient_max: Decimal,
    pub normal_max: Decimal,
}

impl Default for EfficiencyBands {
    fn default() -> Self {
        Self {
            efficient_max: Decimal::from(1800),
            normal_max: Decimal::from(2200),
        }
    }
}

impl EfficiencyBands {
    pub fn band(&self, average: Decimal) -> EfficiencyBand {
        if average <= self.efficient_max {
            EfficiencyBand::Efficient
        } else if average <= self.normal_max {
            EfficiencyBand::Normal
        } else {
            EfficiencyBand::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckEfficiency {
    pub truck_no: String,
    pub trips: u64,
    pub consumed: Decimal,
    pub average_per_trip: Decimal,
    pub band: EfficiencyBand,
}

pub fn truck_efficiency(records: &[FuelRecord], bands: &EfficiencyBands) -> Vec<TruckEfficiency> {
    let mut trucks: BTreeMap<&str, (String, u64, Decimal)> = BTreeMap::new();

    for record in records.iter().filter(|r| !r.is_deleted) {
        let (_, trips, consumed) = trucks
            .entry(record.truck_key.as_str())
            .or_insert_with(|| (record.truck_no.clone(), 0, Decimal::ZERO));
        *trips += 1;
        *consumed += record.consumed();
    }

    trucks
        .into_values()
        .map(|(truck_no, trips, consumed)| {
            let average_per_trip = (consumed / Decimal::from(trips)).round_dp(2);
            TruckEfficiency {
                truck_no,
                trips,
                consumed,
                average_per_trip,
                band: bands.band(average_per_trip),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationCost {
    pub station: String,
    pub lpo_count: u64,
    pub cancelled_count: u64,
    pub litres: Decimal,
    pub cost: Decimal,
}

/// Cancelled rows are counted but add no litres or cost; deleted rows are
/// ignored entirely.
pub fn station_costs(lpos: &[LpoEntry]) -> Vec<StationCost> {
    let mut stations: BTreeMap<String, StationCost> = BTreeMap::new();

    for lpo in lpos.iter().filter(|l| !l.is_deleted) {
        let cost = stations
            .entry(crate::models::station_key(&lpo.station))
            .or_insert_with(|| StationCost {
                station: lpo.station.clone(),
                lpo_count: 0,
                cancelled_count: 0,
                litres: Decimal::ZERO,
                cost: Decimal::ZERO,
            });
        cost.lpo_count += 1;
        if lpo.status == LpoStatus::Cancelled {
            cost.cancelled_count += 1;
            continue;
        }
        cost.litres += lpo.litres;
        cost.cost += lpo.litres * lpo.rate;
    }

    stations.into_values().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordExtraFuel {
    pub fuel_record_id: String,
    pub truck_no: String,
    pub going_do: String,
    pub flags: Vec<ExtraFuelFlag>,
    pub total_delta: Decimal,
}

/// Flagged records only.
pub fn extra_fuel_report(records: &[FuelRecord], standards: &ExtraFuelStandards) -> Vec<RecordExtraFuel> {
    records
        .iter()
        .filter(|r| !r.is_deleted)
        .filter_map(|record| {
            let flags = detect_extra_fuel(record, standards);
            if flags.is_empty() {
                return None;
            }
            Some(RecordExtraFuel {
                fuel_record_id: record.id.clone(),
                truck_no: record.truck_no.clone(),
                going_do: record.going_do.clone(),
                total_delta: flags.iter().map(|f| f.delta).sum(),
                flags,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LedgerColumn, PaymentMode};
    use chrono::{NaiveDate, Utc};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
    }

    fn trip(truck: &str, to: &str, yard: i64, used: i64) -> FuelRecord {
        let mut r = FuelRecord::new(truck, "DO-1", "Dar", to, day(), "ops");
        r.apply_litres(LedgerColumn::DarYard, Decimal::from(yard));
        r.apply_litres(LedgerColumn::ZambiaGoing, Decimal::from(used));
        r
    }

    #[test]
    fn route_totals_group_by_route_and_skip_deleted() {
        let mut deleted = trip("T3", "Lusaka", 100, 100);
        deleted.soft_delete(Utc::now());
        let records = vec![
            trip("T1", "Lusaka", 2000, 1900),
            trip("T2", "lusaka", 2100, 2000),
            trip("T1", "Ndola", 2200, 2300),
            deleted,
        ];

        let totals = route_totals(&records);
        assert_eq!(totals.len(), 2);
        let lusaka = &totals[0];
        assert_eq!(lusaka.trips, 2);
        assert_eq!(lusaka.allocated, Decimal::from(4100));
        assert_eq!(lusaka.consumed, Decimal::from(3900));
        assert_eq!(lusaka.balance, Decimal::from(200));
    }

    #[test]
    fn trucks_are_banded_by_average() {
        let records = vec![
            trip("T530 DRF", "Lusaka", 0, 1700),
            trip("t530drf", "Lusaka", 0, 1900),
            trip("T2", "Lusaka", 0, 2100),
            trip("T3", "Lusaka", 0, 2500),
        ];
        let report = truck_efficiency(&records, &EfficiencyBands::default());

        let band_of = |truck: &str| {
            report
                .iter()
                .find(|t| crate::models::normalize_truck(&t.truck_no) == truck)
                .map(|t| t.band)
        };
        assert_eq!(band_of("T530DRF"), Some(EfficiencyBand::Efficient));
        assert_eq!(band_of("T2"), Some(EfficiencyBand::Normal));
        assert_eq!(band_of("T3"), Some(EfficiencyBand::High));
    }

    #[test]
    fn station_costs_exclude_cancelled_litres() {
        let lpo = |litres: i64| {
            LpoEntry::new(
                "LPO-1",
                "Station X",
                day(),
                "T1",
                "DO-1",
                "Lusaka",
                Decimal::from(litres),
                Decimal::from(3000),
                PaymentMode::Station,
                "clerk",
            )
        };
        let mut cancelled = lpo(500);
        cancelled.cancel("clerk", Utc::now());

        let costs = station_costs(&[lpo(100), lpo(200), cancelled]);
        assert_eq!(costs.len(), 1);
        assert_eq!(costs[0].lpo_count, 3);
        assert_eq!(costs[0].cancelled_count, 1);
        assert_eq!(costs[0].litres, Decimal::from(300));
        assert_eq!(costs[0].cost, Decimal::from(900_000));
    }

    #[test]
    fn extra_fuel_report_lists_flagged_records_only() {
        let records = vec![trip("T1", "Lusaka", 600, 200), trip("T2", "Lusaka", 500, 100)];
        let report = extra_fuel_report(&records, &ExtraFuelStandards::default());
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].truck_no, "T1");
        assert_eq!(report[0].total_delta, Decimal::from(50));
    }
}
