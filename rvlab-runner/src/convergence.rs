//! Convergence study — many independent seeded runs of the harness.
//!
//! Trial `t` runs the full pipeline with master seed
//! `RngHierarchy::new(master_seed).trial_seed(t)`, so any single trial can be
//! replayed with `rvlab run --seed <trial seed>`. Trials run in parallel with
//! rayon; the summary is independent of thread count.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use rvlab_core::{RngHierarchy, SimulationConfig};

use crate::config::ConvergenceParams;
use crate::pipeline::{run_harness, RunError};

/// Outcome of one trial for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub trial: u64,
    pub seed: u64,
    pub asset: String,
    pub avg_realized_vol: f64,
    pub input_vol: f64,
}

impl TrialOutcome {
    pub fn relative_error(&self) -> f64 {
        (self.avg_realized_vol - self.input_vol) / self.input_vol
    }
}

/// Cross-trial summary for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConvergence {
    pub asset: String,
    pub input_vol: f64,
    pub trials: usize,
    /// Mean over trials of the day-averaged realized volatility.
    pub mean_realized_vol: f64,
    /// Sample standard deviation across trials (0 for a single trial).
    pub std_realized_vol: f64,
    pub mean_relative_error_pct: f64,
    /// Largest absolute single-trial relative error.
    pub worst_relative_error_pct: f64,
    pub within_tolerance: bool,
}

/// Result of a convergence study.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub master_seed: u64,
    pub trials: usize,
    pub tolerance_pct: f64,
    pub n_day: usize,
    pub n_tick_per_day: usize,
    pub assets: Vec<AssetConvergence>,
    pub outcomes: Vec<TrialOutcome>,
}

impl ConvergenceReport {
    pub fn all_within_tolerance(&self) -> bool {
        self.assets.iter().all(|a| a.within_tolerance)
    }
}

/// Run `params.trials` independent harness runs and summarize per asset.
pub fn run_convergence(
    config: &SimulationConfig,
    params: &ConvergenceParams,
    master_seed: u64,
) -> Result<ConvergenceReport, RunError> {
    params.validate()?;
    let hierarchy = RngHierarchy::new(master_seed);
    info!(
        master_seed,
        trials = params.trials,
        n_day = config.n_day(),
        "starting convergence study"
    );

    let per_trial = (0..params.trials as u64)
        .into_par_iter()
        .map(|trial| {
            let seed = hierarchy.trial_seed(trial);
            let report = run_harness(&config.with_seed(Some(seed)))?;
            Ok(report
                .asset_precision
                .into_iter()
                .map(|p| TrialOutcome {
                    trial,
                    seed,
                    asset: p.asset,
                    avg_realized_vol: p.avg_realized_vol,
                    input_vol: p.input_vol,
                })
                .collect::<Vec<_>>())
        })
        .collect::<Result<Vec<_>, RunError>>()?;
    let outcomes: Vec<TrialOutcome> = per_trial.into_iter().flatten().collect();

    let assets = summarize(&outcomes, params.tolerance_pct);
    for a in assets.iter().filter(|a| !a.within_tolerance) {
        warn!(
            asset = %a.asset,
            mean_relative_error_pct = a.mean_relative_error_pct,
            tolerance_pct = params.tolerance_pct,
            "mean realized volatility outside tolerance"
        );
    }

    Ok(ConvergenceReport {
        master_seed,
        trials: params.trials,
        tolerance_pct: params.tolerance_pct,
        n_day: config.n_day(),
        n_tick_per_day: config.n_tick_per_day(),
        assets,
        outcomes,
    })
}

/// Aggregate trial outcomes per asset, ordered by label.
pub fn summarize(outcomes: &[TrialOutcome], tolerance_pct: f64) -> Vec<AssetConvergence> {
    let mut by_asset: BTreeMap<&str, Vec<&TrialOutcome>> = BTreeMap::new();
    for o in outcomes {
        by_asset.entry(o.asset.as_str()).or_default().push(o);
    }

    by_asset
        .into_iter()
        .map(|(asset, trials)| {
            let n = trials.len() as f64;
            let input_vol = trials[0].input_vol;
            let mean = trials.iter().map(|t| t.avg_realized_vol).sum::<f64>() / n;
            let std = if trials.len() > 1 {
                let ss: f64 = trials
                    .iter()
                    .map(|t| (t.avg_realized_vol - mean).powi(2))
                    .sum();
                (ss / (n - 1.0)).sqrt()
            } else {
                0.0
            };
            let mean_relative_error_pct =
                trials.iter().map(|t| t.relative_error()).sum::<f64>() / n * 100.0;
            let worst_relative_error_pct = trials
                .iter()
                .map(|t| t.relative_error().abs() * 100.0)
                .fold(0.0, f64::max);
            AssetConvergence {
                asset: asset.to_string(),
                input_vol,
                trials: trials.len(),
                mean_realized_vol: mean,
                std_realized_vol: std,
                mean_relative_error_pct,
                worst_relative_error_pct,
                within_tolerance: mean_relative_error_pct.abs() <= tolerance_pct,
            }
        })
        .collect()
}
