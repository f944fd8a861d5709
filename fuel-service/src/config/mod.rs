use crate::domain::{EfficiencyBands, ExtraFuelStandards};
use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::config::get_env;
use service_core::error::AppError;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct FuelConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub store_backend: StoreBackend,
    pub standards: ExtraFuelStandards,
    pub bands: EfficiencyBands,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl FuelConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_production();

        let store_backend: StoreBackend = get_env("STORE_BACKEND", Some("mongo"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // A memory-backed instance never talks to MongoDB.
        let mongo_default = match store_backend {
            StoreBackend::Memory => Some("mongodb://localhost:27017"),
            StoreBackend::Mongo => None,
        };

        Ok(FuelConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", mongo_default, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("fuel_db"), is_prod)?,
            },
            store_backend,
            standards: load_standards()?,
            bands: EfficiencyBands {
                efficient_max: decimal_env(
                    "EFFICIENCY_EFFICIENT_MAX",
                    EfficiencyBands::default().efficient_max,
                )?,
                normal_max: decimal_env(
                    "EFFICIENCY_NORMAL_MAX",
                    EfficiencyBands::default().normal_max,
                )?,
            },
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
        })
    }

    /// In-memory configuration for tests; binds an ephemeral port.
    pub fn for_tests() -> Self {
        FuelConfig {
            common: core_config::Config { port: 0 },
            mongodb: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "fuel_test".to_string(),
            },
            store_backend: StoreBackend::Memory,
            standards: ExtraFuelStandards::default(),
            bands: EfficiencyBands::default(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

/// Standard allocations with `fuel_standards.<column>` overrides from the
/// layered config (`APP__FUEL_STANDARDS__MBEYA_GOING=-450`).
fn load_standards() -> Result<ExtraFuelStandards, AppError> {
    let overrides: HashMap<String, String> = core_config::layered()?
        .get("fuel_standards")
        .unwrap_or_default();

    ExtraFuelStandards::with_overrides(&overrides)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))
}

fn decimal_env(key: &str, default: Decimal) -> Result<Decimal, AppError> {
    match env::var(key) {
        Ok(raw) => Decimal::from_str(raw.trim()).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} is not a number: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_known_values() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("MongoDB".parse::<StoreBackend>(), Ok(StoreBackend::Mongo));
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_config_uses_memory_store_on_ephemeral_port() {
        let config = FuelConfig::for_tests();
        assert_eq!(config.common.port, 0);
        assert_eq!(config.store_backend, StoreBackend::Memory);
    }

    #[test]
    fn unset_decimal_env_falls_back() {
        let value = decimal_env("FUEL_TEST_UNSET_DECIMAL", Decimal::from(1800)).unwrap();
        assert_eq!(value, Decimal::from(1800));
    }
}
