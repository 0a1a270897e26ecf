//! Realized volatility estimation.
//!
//! `vol_rea = sqrt(n_bd_year * n_tick_per_day * terminal_sum / n_tick)`:
//! the mean squared return per tick, scaled to an annual variance and
//! square-rooted.

use serde::{Deserialize, Serialize};

use crate::aggregate::DayGroup;

/// Ticks-per-year convention used to annualize per-tick variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualizationBasis {
    pub n_bd_year: usize,
    pub n_tick_per_day: usize,
}

impl AnnualizationBasis {
    /// `n_bd_year * n_tick_per_day`.
    pub fn factor(&self) -> f64 {
        (self.n_bd_year * self.n_tick_per_day) as f64
    }
}

/// Realized volatility for one (day, asset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealizedVolRecord {
    pub day: usize,
    pub asset: String,
    pub n_tick: usize,
    pub terminal_sum: f64,
    pub vol_rea: f64,
}

/// Annualized realized volatility. NaN when `n_tick` is zero.
pub fn realized_volatility(terminal_sum: f64, n_tick: usize, basis: AnnualizationBasis) -> f64 {
    if n_tick == 0 {
        return f64::NAN;
    }
    (basis.factor() * (terminal_sum / n_tick as f64)).sqrt()
}

/// Estimate realized volatility per day group, ordered by asset then day.
pub fn estimate(groups: &[DayGroup], basis: AnnualizationBasis) -> Vec<RealizedVolRecord> {
    let mut records: Vec<RealizedVolRecord> = groups
        .iter()
        .map(|g| {
            let n_tick = g.n_tick();
            let terminal_sum = g.terminal_sum();
            RealizedVolRecord {
                day: g.day,
                asset: g.asset.clone(),
                n_tick,
                terminal_sum,
                vol_rea: realized_volatility(terminal_sum, n_tick, basis),
            }
        })
        .collect();
    records.sort_by(|a, b| a.asset.cmp(&b.asset).then(a.day.cmp(&b.day)));
    records
}
