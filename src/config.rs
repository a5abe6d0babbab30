use crate::domain::clock::DEFAULT_UTC_OFFSET_MINUTES;
use crate::domain::{CivilClock, Decimal};
use crate::engine::ledger::DEFAULT_COMMISSION_PCT;
use crate::engine::CommissionPolicy;
use std::collections::HashMap;
use thiserror::Error;

/// Widest commission percentage accepted from the environment.
const MAX_COMMISSION_PCT: i64 = 10;
/// Real-world civil offsets stay within ±14h.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub snapshot_path: String,
    pub default_commission_pct: Decimal,
    pub default_commission_pct_usd: Decimal,
    pub civil_utc_offset_minutes: i32,
    pub force_recalculate: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let snapshot_path = env_map
            .get("SNAPSHOT_PATH")
            .cloned()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("SNAPSHOT_PATH".to_string()))?;

        let default_commission_pct = parse_commission(&env_map, "DEFAULT_COMMISSION_PCT")?;
        let default_commission_pct_usd = parse_commission(&env_map, "DEFAULT_COMMISSION_PCT_USD")?;

        let civil_utc_offset_minutes = match env_map.get("CIVIL_UTC_OFFSET_MINUTES") {
            Some(raw) => raw.trim().parse::<i32>().map_err(|_| {
                ConfigError::InvalidValue(
                    "CIVIL_UTC_OFFSET_MINUTES".to_string(),
                    "must be a valid i32".to_string(),
                )
            })?,
            None => DEFAULT_UTC_OFFSET_MINUTES,
        };
        if civil_utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::InvalidValue(
                "CIVIL_UTC_OFFSET_MINUTES".to_string(),
                format!(
                    "must be within ±{} minutes, got {}",
                    MAX_UTC_OFFSET_MINUTES, civil_utc_offset_minutes
                ),
            ));
        }

        let force_recalculate = match env_map
            .get("FORCE_RECALCULATE")
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
            .unwrap_or("false")
        {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" | "" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "FORCE_RECALCULATE".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        Ok(Config {
            snapshot_path,
            default_commission_pct,
            default_commission_pct_usd,
            civil_utc_offset_minutes,
            force_recalculate,
        })
    }

    pub fn commission_policy(&self) -> CommissionPolicy {
        CommissionPolicy::new(self.default_commission_pct, self.default_commission_pct_usd)
    }

    pub fn civil_clock(&self) -> CivilClock {
        // Range checked in from_env_map.
        CivilClock::new(self.civil_utc_offset_minutes).unwrap_or_default()
    }
}

/// Read a commission percentage, falling back to the platform default.
fn parse_commission(env_map: &HashMap<String, String>, key: &str) -> Result<Decimal, ConfigError> {
    let pct = env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_COMMISSION_PCT)
        .parse::<Decimal>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string(), "must be a decimal number".to_string()))?;
    if pct.is_negative() || pct > Decimal::from(MAX_COMMISSION_PCT) {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("must be between 0 and {}, got {}", MAX_COMMISSION_PCT, pct),
        ));
    }
    Ok(pct)
}
