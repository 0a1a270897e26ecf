//! Harness pipeline — wires calendar, simulation, aggregation and estimation.
//!
//! Three entry points:
//! - `run_harness()`: simulates from the configured seed (or entropy). Used by the CLI.
//! - `run_from_paths()`: runs the estimation stages over pre-built price paths.
//! - `run_with_returns()`: replays prescribed per-asset returns. Used for exact scenarios.
//!
//! Per-asset stages (simulate, derive returns) fan out across threads with
//! rayon. Every asset owns its generator, so results do not depend on
//! scheduling.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use rvlab_core::calendar::{self, AlignmentError};
use rvlab_core::domain::{AssetSpec, PricePath};
use rvlab_core::precision::LookupError;
use rvlab_core::simulate::{simulate_asset, FixedReturns, GaussianReturns, SimulationError};
use rvlab_core::{
    derive_returns, estimate, explode, group_by_day, per_asset_precision, per_day_precision,
    unpivot, AssetPrecision, CumulativePoint, DailyPrecision, DayGroup, InputVolatilities,
    RealizedVolRecord, ReturnSeries, RngSource, SimulationConfig, SquaredReturnRow,
};

use crate::config::{run_id_for, ConfigError, RunId};

/// Errors from the harness.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("alignment error: {0}")]
    Alignment(#[from] AlignmentError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("precision lookup error: {0}")]
    Lookup(#[from] LookupError),
    #[error("no returns supplied for asset '{0}'")]
    MissingReturns(String),
    #[error("no price path for configured asset '{0}'")]
    MissingPath(String),
}

/// Current schema version for serialized reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Every table the pipeline produces for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessReport {
    pub schema_version: u32,
    pub run_id: RunId,
    pub seed: Option<u64>,
    pub n_day: usize,
    pub n_tick_per_day: usize,
    pub n_bd_year: usize,
    pub assets: Vec<AssetSpec>,
    /// Prices and returns, one series per asset.
    pub returns: Vec<ReturnSeries>,
    /// Long-form squared returns, ordered by tick then asset.
    pub squared_returns: Vec<SquaredReturnRow>,
    /// Per-(day, asset) lists with cumulative sums.
    pub day_groups: Vec<DayGroup>,
    /// Flattened cumulative series.
    pub cumulative: Vec<CumulativePoint>,
    /// Realized volatility per (day, asset), ordered by asset then day.
    pub realized: Vec<RealizedVolRecord>,
    pub asset_precision: Vec<AssetPrecision>,
    pub daily_precision: Vec<DailyPrecision>,
}

/// Run the full harness for a validated configuration.
pub fn run_harness(config: &SimulationConfig) -> Result<HarnessReport, RunError> {
    let rngs = RngSource::from_seed(config.seed());
    if !rngs.is_reproducible() {
        warn!("no seed configured; this run is not reproducible");
    }
    let paths = simulate_parallel(config, &rngs)?;
    run_from_paths(config, paths)
}

/// Simulate each asset on its own thread with its own generator.
///
/// Produces the same paths as `rvlab_core::simulate` for a seeded source.
pub fn simulate_parallel(
    config: &SimulationConfig,
    rngs: &RngSource,
) -> Result<BTreeMap<String, PricePath>, SimulationError> {
    config
        .assets()
        .par_iter()
        .map(|asset| {
            let mut source = GaussianReturns::new(rngs.rng_for(&asset.label));
            simulate_asset(config, asset, &mut source).map(|p| (asset.label.clone(), p))
        })
        .collect()
}

/// Replay prescribed returns, one vector of `n_ticks` per configured asset.
///
/// As in simulation, index 0 of each vector is not applied to any price.
pub fn run_with_returns(
    config: &SimulationConfig,
    returns: &BTreeMap<String, Vec<f64>>,
) -> Result<HarnessReport, RunError> {
    let mut paths = BTreeMap::new();
    for asset in config.assets() {
        let prescribed = returns
            .get(&asset.label)
            .ok_or_else(|| RunError::MissingReturns(asset.label.clone()))?;
        let mut source = FixedReturns::new(prescribed.clone());
        paths.insert(
            asset.label.clone(),
            simulate_asset(config, asset, &mut source)?,
        );
    }
    run_from_paths(config, paths)
}

/// Run the estimation stages over existing price paths.
///
/// `paths` must hold exactly one path per configured asset.
pub fn run_from_paths(
    config: &SimulationConfig,
    paths: BTreeMap<String, PricePath>,
) -> Result<HarnessReport, RunError> {
    check_path_coverage(config, &paths)?;
    let n_tick_per_day = config.n_tick_per_day();
    let stamps = calendar::generate(config);
    calendar::validate_alignment(&stamps, config.n_day(), n_tick_per_day)?;

    let paths: Vec<PricePath> = paths.into_values().collect();
    let returns = paths
        .par_iter()
        .map(|p| derive_returns(p, &stamps))
        .collect::<Result<Vec<_>, _>>()?;

    let squared_returns = unpivot(&returns);
    let day_groups = group_by_day(&squared_returns, n_tick_per_day)?;
    let cumulative = explode(&day_groups);
    let realized = estimate(&day_groups, config.annualization());

    let inputs = InputVolatilities::from_config(config);
    let asset_precision = per_asset_precision(&realized, &inputs)?;
    let daily_precision = per_day_precision(&realized, &inputs)?;

    for p in &asset_precision {
        info!(
            asset = %p.asset,
            avg_realized_vol = p.avg_realized_vol,
            input_vol = p.input_vol,
            relative_error_pct = p.relative_error_pct,
            "realized volatility vs input"
        );
    }

    Ok(HarnessReport {
        schema_version: SCHEMA_VERSION,
        run_id: run_id_for(config.params()),
        seed: config.seed(),
        n_day: config.n_day(),
        n_tick_per_day,
        n_bd_year: config.n_bd_year(),
        assets: config.assets().to_vec(),
        returns,
        squared_returns,
        day_groups,
        cumulative,
        realized,
        asset_precision,
        daily_precision,
    })
}

fn check_path_coverage(
    config: &SimulationConfig,
    paths: &BTreeMap<String, PricePath>,
) -> Result<(), RunError> {
    if let Some(missing) = config
        .assets()
        .iter()
        .find(|a| !paths.contains_key(&a.label))
    {
        return Err(RunError::MissingPath(missing.label.clone()));
    }
    if let Some(extra) = paths
        .keys()
        .find(|label| !config.assets().iter().any(|a| &a.label == *label))
    {
        return Err(LookupError::MissingInputVol(extra.clone()).into());
    }
    Ok(())
}
