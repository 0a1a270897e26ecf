//! Simulation configuration.
//!
//! `SimulationParams` is the serde-facing shape read from a harness file.
//! `SimulationConfig` is the validated, immutable form every pipeline stage
//! consumes. Validation happens once, eagerly, before any simulation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::domain::AssetSpec;
use crate::estimator::AnnualizationBasis;

const SECONDS_PER_DAY: u64 = 24 * 3600;

/// Raw simulation parameters, as written in a config file.
///
/// Missing fields fall back to [`SimulationParams::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Number of simulated trading days.
    pub n_day: usize,
    /// Duration of one tick in seconds.
    pub tick_duration_sec: u64,
    /// Length of the trading session in seconds.
    pub trading_day_sec: u64,
    /// Hour of day at which each session opens.
    pub day_start_hour: u32,
    /// Trading days per year used for (de-)annualization.
    pub n_bd_year: usize,
    /// Calendar date of simulated day 0.
    pub start_date: NaiveDate,
    /// Master seed. `None` draws generators from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub assets: Vec<AssetSpec>,
}

impl Default for SimulationParams {
    /// Five 7-hour days of one-minute ticks for two assets at 20% and 40%.
    fn default() -> Self {
        Self {
            n_day: 5,
            tick_duration_sec: 60,
            trading_day_sec: 7 * 3600,
            day_start_hour: 9,
            n_bd_year: 252,
            start_date: NaiveDate::from_ymd_opt(2025, 4, 8).unwrap_or_default(),
            seed: None,
            assets: vec![
                AssetSpec::new("A", 100.0, 0.20),
                AssetSpec::new("B", 100.0, 0.40),
            ],
        }
    }
}

/// Configuration constraint violations.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("n_day must be >= 1")]
    NoDays,
    #[error("tick_duration_sec must be > 0")]
    ZeroTickDuration,
    #[error("trading_day_sec must be > 0")]
    ZeroTradingDay,
    #[error("trading_day_sec of {0}s exceeds one day; sessions would overlap")]
    SessionTooLong(u64),
    #[error("trading day of {trading_day_sec}s holds no full tick of {tick_duration_sec}s")]
    NoTicksPerDay {
        trading_day_sec: u64,
        tick_duration_sec: u64,
    },
    #[error("day_start_hour must be in 0..24, got {0}")]
    InvalidStartHour(u32),
    #[error("n_bd_year must be > 0")]
    ZeroYear,
    #[error("at least one asset is required")]
    NoAssets,
    #[error("asset label must not be empty")]
    EmptyLabel,
    #[error("duplicate asset label '{0}'")]
    DuplicateLabel(String),
    #[error("asset '{label}': start_price must be finite and > 0, got {value}")]
    InvalidStartPrice { label: String, value: f64 },
    #[error("asset '{label}': annual_volatility must be finite and > 0, got {value}")]
    InvalidVolatility { label: String, value: f64 },
}

/// Validated simulation configuration.
///
/// Construct with [`SimulationConfig::new`]; fields are private so the
/// derived tick counts can never drift from the raw parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    params: SimulationParams,
    n_tick_per_day: usize,
}

impl SimulationConfig {
    pub fn new(params: SimulationParams) -> Result<Self, ConfigError> {
        if params.n_day == 0 {
            return Err(ConfigError::NoDays);
        }
        if params.tick_duration_sec == 0 {
            return Err(ConfigError::ZeroTickDuration);
        }
        if params.trading_day_sec == 0 {
            return Err(ConfigError::ZeroTradingDay);
        }
        if params.trading_day_sec > SECONDS_PER_DAY {
            return Err(ConfigError::SessionTooLong(params.trading_day_sec));
        }
        let n_tick_per_day = (params.trading_day_sec / params.tick_duration_sec) as usize;
        if n_tick_per_day == 0 {
            return Err(ConfigError::NoTicksPerDay {
                trading_day_sec: params.trading_day_sec,
                tick_duration_sec: params.tick_duration_sec,
            });
        }
        if params.day_start_hour >= 24 {
            return Err(ConfigError::InvalidStartHour(params.day_start_hour));
        }
        if params.n_bd_year == 0 {
            return Err(ConfigError::ZeroYear);
        }
        validate_assets(&params.assets)?;

        Ok(Self {
            params,
            n_tick_per_day,
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn n_day(&self) -> usize {
        self.params.n_day
    }

    pub fn n_tick_per_day(&self) -> usize {
        self.n_tick_per_day
    }

    /// Total number of ticks across all days.
    pub fn n_ticks(&self) -> usize {
        self.params.n_day * self.n_tick_per_day
    }

    pub fn n_bd_year(&self) -> usize {
        self.params.n_bd_year
    }

    /// Trading ticks per year: `n_bd_year * n_tick_per_day`.
    pub fn ticks_per_year(&self) -> usize {
        self.params.n_bd_year * self.n_tick_per_day
    }

    pub fn tick_duration_sec(&self) -> u64 {
        self.params.tick_duration_sec
    }

    pub fn day_start_hour(&self) -> u32 {
        self.params.day_start_hour
    }

    pub fn start_date(&self) -> NaiveDate {
        self.params.start_date
    }

    pub fn assets(&self) -> &[AssetSpec] {
        &self.params.assets
    }

    pub fn seed(&self) -> Option<u64> {
        self.params.seed
    }

    /// Same configuration with a different master seed.
    pub fn with_seed(&self, seed: Option<u64>) -> Self {
        let mut next = self.clone();
        next.params.seed = seed;
        next
    }

    /// Same configuration over a different number of days.
    pub fn with_days(&self, n_day: usize) -> Result<Self, ConfigError> {
        Self::new(SimulationParams {
            n_day,
            ..self.params.clone()
        })
    }

    pub fn annualization(&self) -> AnnualizationBasis {
        AnnualizationBasis {
            n_bd_year: self.params.n_bd_year,
            n_tick_per_day: self.n_tick_per_day,
        }
    }
}

impl TryFrom<SimulationParams> for SimulationConfig {
    type Error = ConfigError;

    fn try_from(params: SimulationParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

fn validate_assets(assets: &[AssetSpec]) -> Result<(), ConfigError> {
    if assets.is_empty() {
        return Err(ConfigError::NoAssets);
    }
    let mut seen = HashSet::new();
    for asset in assets {
        if asset.label.is_empty() {
            return Err(ConfigError::EmptyLabel);
        }
        if !seen.insert(asset.label.as_str()) {
            return Err(ConfigError::DuplicateLabel(asset.label.clone()));
        }
        if !(asset.start_price.is_finite() && asset.start_price > 0.0) {
            return Err(ConfigError::InvalidStartPrice {
                label: asset.label.clone(),
                value: asset.start_price,
            });
        }
        if !(asset.annual_volatility.is_finite() && asset.annual_volatility > 0.0) {
            return Err(ConfigError::InvalidVolatility {
                label: asset.label.clone(),
                value: asset.annual_volatility,
            });
        }
    }
    Ok(())
}
