use super::checkpoint::{Direction, FixedCheckpoint};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Case- and space-insensitive key for a station name.
pub fn station_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// A filling station and the checkpoint it serves on each leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    #[serde(rename = "_id")]
    pub key: String,
    pub name: String,
    pub active: bool,
    #[serde(default)]
    pub going_checkpoint: Option<FixedCheckpoint>,
    #[serde(default)]
    pub returning_checkpoint: Option<FixedCheckpoint>,
    #[serde(default)]
    pub default_rate: Option<Decimal>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl StationConfig {
    pub fn new(
        name: &str,
        going_checkpoint: Option<FixedCheckpoint>,
        returning_checkpoint: Option<FixedCheckpoint>,
        default_rate: Option<Decimal>,
    ) -> Self {
        let now = Utc::now();
        Self {
            key: station_key(name),
            name: name.trim().to_string(),
            active: true,
            going_checkpoint,
            returning_checkpoint,
            default_rate,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn checkpoint(&self, direction: Direction) -> Option<FixedCheckpoint> {
        match direction {
            Direction::Going => self.going_checkpoint,
            Direction::Returning => self.returning_checkpoint,
        }
    }

    pub fn serves(&self, checkpoint: FixedCheckpoint) -> bool {
        self.going_checkpoint == Some(checkpoint) || self.returning_checkpoint == Some(checkpoint)
    }
}
