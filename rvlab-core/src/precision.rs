//! Estimator precision versus the known input volatility.
//!
//! Two views: per asset, with realized volatility averaged over all days,
//! and per (day, asset). Error columns are rounded for display: 4 decimals
//! for volatilities and error ratios, 2 for percentages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SimulationConfig;
use crate::estimator::RealizedVolRecord;

#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    #[error("no input volatility for asset '{0}'")]
    MissingInputVol(String),
}

/// Asset label → input (true) annualized volatility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputVolatilities(BTreeMap<String, f64>);

impl InputVolatilities {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self(
            config
                .assets()
                .iter()
                .map(|a| (a.label.clone(), a.annual_volatility))
                .collect(),
        )
    }

    pub fn get(&self, asset: &str) -> Result<f64, LookupError> {
        self.0
            .get(asset)
            .copied()
            .ok_or_else(|| LookupError::MissingInputVol(asset.to_string()))
    }
}

impl FromIterator<(String, f64)> for InputVolatilities {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Precision of the day-averaged estimate for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPrecision {
    pub asset: String,
    pub avg_realized_vol: f64,
    pub input_vol: f64,
    pub absolute_error: f64,
    pub relative_error: f64,
    pub relative_error_pct: f64,
}

/// Precision of a single day's estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPrecision {
    pub day: usize,
    pub asset: String,
    pub vol_rea: f64,
    pub input_vol: f64,
    pub error_pct: f64,
}

/// Round half away from zero to `dp` decimal places.
pub fn round_dp(value: f64, dp: i32) -> f64 {
    let scale = 10f64.powi(dp);
    (value * scale).round() / scale
}

/// Per-asset precision of the mean realized volatility across days.
///
/// Output is ordered by asset label.
pub fn per_asset_precision(
    records: &[RealizedVolRecord],
    inputs: &InputVolatilities,
) -> Result<Vec<AssetPrecision>, LookupError> {
    let mut by_asset: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in records {
        let entry = by_asset.entry(r.asset.as_str()).or_insert((0.0, 0));
        entry.0 += r.vol_rea;
        entry.1 += 1;
    }

    by_asset
        .into_iter()
        .map(|(asset, (sum, count))| {
            let input_vol = inputs.get(asset)?;
            let avg_realized_vol = sum / count as f64;
            let absolute_error = avg_realized_vol - input_vol;
            let relative_error = absolute_error / input_vol;
            Ok(AssetPrecision {
                asset: asset.to_string(),
                avg_realized_vol,
                input_vol,
                absolute_error: round_dp(absolute_error, 4),
                relative_error: round_dp(relative_error, 4),
                relative_error_pct: round_dp(relative_error * 100.0, 2),
            })
        })
        .collect()
}

/// Per-(day, asset) precision, in the order of `records`.
pub fn per_day_precision(
    records: &[RealizedVolRecord],
    inputs: &InputVolatilities,
) -> Result<Vec<DailyPrecision>, LookupError> {
    records
        .iter()
        .map(|r| {
            let input_vol = inputs.get(&r.asset)?;
            let error_pct = (r.vol_rea - input_vol) / input_vol * 100.0;
            Ok(DailyPrecision {
                day: r.day,
                asset: r.asset.clone(),
                vol_rea: round_dp(r.vol_rea, 4),
                input_vol,
                error_pct: round_dp(error_pct, 2),
            })
        })
        .collect()
}
