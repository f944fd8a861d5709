//! Checkpoint-to-column resolution.

use super::error::{FuelError, FuelResult};
use crate::models::{
    station_key, CancellationPoint, Checkpoint, CheckpointSelection, Direction, FixedCheckpoint,
    LedgerColumn, PaymentMode, StationConfig,
};
use std::collections::HashMap;

/// Active stations as read at the start of a request. Passed explicitly to
/// every rule that needs the fixed-station mapping.
#[derive(Debug, Clone, Default)]
pub struct StationSnapshot {
    stations: HashMap<String, StationConfig>,
}

impl StationSnapshot {
    /// Inactive stations are dropped.
    pub fn new(stations: impl IntoIterator<Item = StationConfig>) -> Self {
        Self {
            stations: stations
                .into_iter()
                .filter(|s| s.active)
                .map(|s| (s.key.clone(), s))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&StationConfig> {
        self.stations.get(&station_key(name))
    }

    /// Fixed checkpoint served by `station` on `direction`.
    pub fn checkpoint_for(&self, station: &str, direction: Direction) -> FuelResult<FixedCheckpoint> {
        let config = self.get(station).ok_or_else(|| {
            FuelError::NotFound(format!("Station not found or inactive: {}", station))
        })?;
        config.checkpoint(direction).ok_or_else(|| {
            FuelError::MissingCheckpointSelection(format!(
                "station {} has no {} checkpoint configured",
                config.name, direction
            ))
        })
    }

    /// Whether a row at `station` counts as sitting on `checkpoint`.
    pub fn is_attached(&self, station: &str, checkpoint: &Checkpoint) -> bool {
        match checkpoint {
            Checkpoint::Fixed { checkpoint } => self
                .get(station)
                .is_some_and(|config| config.serves(*checkpoint)),
            Checkpoint::Custom { station_name, .. } => {
                station_key(station_name) == station_key(station)
            }
        }
    }
}

/// Resolve a submitted cancellation point into a concrete checkpoint.
pub fn resolve(point: &CancellationPoint) -> FuelResult<Checkpoint> {
    match &point.selection {
        CheckpointSelection::Fixed { checkpoint } => {
            if checkpoint.direction() != point.direction {
                return Err(FuelError::validation(
                    "cancellation_point",
                    format!(
                        "checkpoint {} is on the {} leg, not {}",
                        checkpoint,
                        checkpoint.direction(),
                        point.direction
                    ),
                ));
            }
            Ok(Checkpoint::Fixed {
                checkpoint: *checkpoint,
            })
        }
        CheckpointSelection::Custom(custom) => {
            let station_name = custom.station_name.trim();
            if station_name.is_empty() {
                return Err(FuelError::validation(
                    "cancellation_point",
                    "custom station name is required",
                ));
            }

            let (enabled, column) = match point.direction {
                Direction::Going => (custom.going_enabled, custom.going_column),
                Direction::Returning => (custom.returning_enabled, custom.returning_column),
            };
            if !enabled {
                return Err(FuelError::validation(
                    "cancellation_point",
                    format!(
                        "custom station {} is not enabled for the {} leg",
                        station_name, point.direction
                    ),
                ));
            }
            let column = column.ok_or_else(|| {
                FuelError::MissingCheckpointSelection(format!(
                    "custom station {} has no {} column selected",
                    station_name, point.direction
                ))
            })?;
            ensure_column_fits(column, point.direction)?;

            Ok(Checkpoint::Custom {
                station_name: station_name.to_string(),
                direction: point.direction,
                column,
            })
        }
    }
}

/// Apply the payment-mode rules before resolving:
/// CASH must carry a point, STATION must not, DRIVER_ACCOUNT may.
pub fn resolve_for_lpo(
    mode: PaymentMode,
    point: Option<&CancellationPoint>,
) -> FuelResult<Option<Checkpoint>> {
    match (mode, point) {
        (PaymentMode::Cash, None) => Err(FuelError::MissingCheckpointSelection(
            "CASH entries must name the checkpoint being paid for".to_string(),
        )),
        (PaymentMode::Cash, Some(point)) => resolve(point).map(Some),
        (PaymentMode::Station, Some(_)) => Err(FuelError::validation(
            "cancellation_point",
            "only CASH and DRIVER_ACCOUNT entries may carry a cancellation point",
        )),
        (PaymentMode::Station, None) => Ok(None),
        (PaymentMode::DriverAccount, point) => point.map(resolve).transpose(),
    }
}

fn ensure_column_fits(column: LedgerColumn, direction: Direction) -> FuelResult<()> {
    if column.accepts(direction) {
        Ok(())
    } else {
        Err(FuelError::validation(
            "cancellation_point",
            format!("column {} cannot take {} litres", column, direction),
        ))
    }
}
