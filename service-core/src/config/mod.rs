use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Ok(layered()?.try_deserialize()?)
    }
}

/// Builds the layered source used by every service: an optional
/// `configuration.{toml,yaml,json}` file overridden by `APP__`-prefixed
/// environment variables (`APP__FUEL_STANDARDS__MBEYA_GOING=-450`).
pub fn layered() -> Result<Cfg, AppError> {
    dotenvy::dotenv().ok();

    let config = Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;

    Ok(config)
}

/// True when `ENVIRONMENT=prod`.
pub fn is_production() -> bool {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod"
}

/// Read a plain environment variable, falling back to `default` outside
/// production. In production every key must be set explicitly.
pub fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_env_uses_default_outside_production() {
        let value = get_env("SERVICE_CORE_TEST_UNSET_KEY", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn get_env_requires_value_in_production() {
        let result = get_env("SERVICE_CORE_TEST_UNSET_KEY", Some("fallback"), true);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn get_env_without_default_is_an_error() {
        let result = get_env("SERVICE_CORE_TEST_UNSET_KEY", None, false);
        assert!(result.is_err());
    }
}
