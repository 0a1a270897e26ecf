//! Harness configuration files.
//!
//! A harness file holds the `[simulation]` parameters plus the optional
//! `[convergence]` study settings. Files are parsed with `toml`, then the
//! simulation block is validated into a `SimulationConfig`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rvlab_core::config::{ConfigError as SimulationConfigError, SimulationConfig, SimulationParams};

/// Content-addressable identifier of a harness configuration.
pub type RunId = String;

/// Errors from loading or validating a harness file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid simulation parameters: {0}")]
    Invalid(#[from] SimulationConfigError),
    #[error("convergence study needs at least one trial")]
    NoTrials,
    #[error("tolerance_pct must be finite and > 0, got {0}")]
    InvalidTolerance(f64),
}

/// Multi-trial convergence study settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceParams {
    /// Number of independent trials.
    #[serde(default = "default_trials")]
    pub trials: usize,
    /// Acceptance band for the mean relative error, in percent.
    #[serde(default = "default_tolerance_pct")]
    pub tolerance_pct: f64,
}

fn default_trials() -> usize {
    64
}

fn default_tolerance_pct() -> f64 {
    15.0
}

impl Default for ConvergenceParams {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            tolerance_pct: default_tolerance_pct(),
        }
    }
}

impl ConvergenceParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::NoTrials);
        }
        if !(self.tolerance_pct.is_finite() && self.tolerance_pct > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.tolerance_pct));
        }
        Ok(())
    }
}

/// Top-level harness file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub simulation: SimulationParams,
    #[serde(default)]
    pub convergence: ConvergenceParams,
}

impl HarnessConfig {
    /// Load and parse a harness file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a harness file from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.convergence.validate()?;
        Ok(config)
    }

    /// Render as TOML (used by `rvlab config`).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate the simulation block.
    pub fn simulation_config(&self) -> Result<SimulationConfig, ConfigError> {
        Ok(SimulationConfig::new(self.simulation.clone())?)
    }

    /// Deterministic hash ID of the full configuration, seed included.
    ///
    /// Two runs with identical configs share a RunId; with a seed set they
    /// also produce identical reports.
    pub fn run_id(&self) -> RunId {
        run_id_for(&self.simulation)
    }
}

/// BLAKE3 hash over the canonical JSON form of simulation parameters.
pub fn run_id_for(params: &SimulationParams) -> RunId {
    let json = serde_json::to_string(params).unwrap_or_default();
    blake3::hash(json.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[simulation]
n_day = 3
tick_duration_sec = 300
trading_day_sec = 23400
day_start_hour = 9
n_bd_year = 252
start_date = "2024-01-02"
seed = 7

[[simulation.assets]]
label = "SPX"
start_price = 4800.0
annual_volatility = 0.15

[convergence]
trials = 10
"#;

    #[test]
    fn parses_harness_file() {
        let config = HarnessConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.simulation.n_day, 3);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.assets[0].label, "SPX");
        assert_eq!(config.convergence.trials, 10);
        assert_eq!(config.convergence.tolerance_pct, 15.0);

        let sim = config.simulation_config().unwrap();
        assert_eq!(sim.n_tick_per_day(), 78);
    }

    #[test]
    fn empty_file_is_default_harness() {
        let config = HarnessConfig::from_toml("").unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.simulation_config().unwrap().n_tick_per_day(), 420);
    }

    #[test]
    fn default_roundtrips_through_toml() {
        let config = HarnessConfig::default();
        let rendered = config.to_toml().unwrap();
        assert_eq!(HarnessConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn invalid_simulation_surfaces_on_validation() {
        let config = HarnessConfig::from_toml(&SAMPLE.replace("0.15", "-0.15")).unwrap();
        assert!(matches!(
            config.simulation_config(),
            Err(ConfigError::Invalid(SimulationConfigError::InvalidVolatility { .. }))
        ));
    }

    #[test]
    fn rejects_zero_trials() {
        let err = HarnessConfig::from_toml(&SAMPLE.replace("trials = 10", "trials = 0"));
        assert!(matches!(err, Err(ConfigError::NoTrials)));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            HarnessConfig::from_toml("[simulation\nn_day = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn run_id_deterministic_and_seed_sensitive() {
        let config = HarnessConfig::default();
        assert_eq!(config.run_id(), config.run_id());
        assert!(!config.run_id().is_empty());

        let mut seeded = config.clone();
        seeded.simulation.seed = Some(1);
        assert_ne!(config.run_id(), seeded.run_id());
    }
}
