use crate::models::{FixedCheckpoint, LedgerColumn, StationConfig};
use crate::services::{NewStation, StationUpdate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStationRequest {
    #[validate(length(min = 1, message = "Station name is required"))]
    pub name: String,
    pub going_checkpoint: Option<FixedCheckpoint>,
    pub returning_checkpoint: Option<FixedCheckpoint>,
    pub default_rate: Option<Decimal>,
}

impl From<CreateStationRequest> for NewStation {
    fn from(req: CreateStationRequest) -> Self {
        Self {
            name: req.name,
            going_checkpoint: req.going_checkpoint,
            returning_checkpoint: req.returning_checkpoint,
            default_rate: req.default_rate,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStationRequest {
    pub active: Option<bool>,
    pub going_checkpoint: Option<FixedCheckpoint>,
    pub returning_checkpoint: Option<FixedCheckpoint>,
    pub default_rate: Option<Decimal>,
}

impl From<UpdateStationRequest> for StationUpdate {
    fn from(req: UpdateStationRequest) -> Self {
        Self {
            active: req.active,
            going_checkpoint: req.going_checkpoint,
            returning_checkpoint: req.returning_checkpoint,
            default_rate: req.default_rate,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StationResponse {
    pub key: String,
    pub name: String,
    pub active: bool,
    pub going_checkpoint: Option<FixedCheckpoint>,
    pub going_column: Option<LedgerColumn>,
    pub returning_checkpoint: Option<FixedCheckpoint>,
    pub returning_column: Option<LedgerColumn>,
    pub default_rate: Option<Decimal>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<StationConfig> for StationResponse {
    fn from(station: StationConfig) -> Self {
        Self {
            going_column: station.going_checkpoint.map(|c| c.column()),
            returning_column: station.returning_checkpoint.map(|c| c.column()),
            key: station.key,
            name: station.name,
            active: station.active,
            going_checkpoint: station.going_checkpoint,
            returning_checkpoint: station.returning_checkpoint,
            default_rate: station.default_rate,
            created_at: station.created_at.to_rfc3339(),
            updated_at: station.updated_at.to_rfc3339(),
        }
    }
}
