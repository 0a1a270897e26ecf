//! Path simulation.
//!
//! Annualized volatility is de-annualized to a per-tick volatility over
//! `n_bd_year * n_tick_per_day` ticks per year, one return is drawn per tick,
//! and returns are compounded multiplicatively from the start price.
//!
//! The draw at index 0 is generated but never applied: the first price is
//! the start price itself. No floor is enforced, so an extreme negative draw
//! could in principle drive a price non-positive.

use std::collections::BTreeMap;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;

use crate::config::SimulationConfig;
use crate::domain::{AssetSpec, PricePath};
use crate::rng::RngSource;

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("invalid normal distribution (std dev {std_dev}): {reason}")]
    Distribution { std_dev: f64, reason: String },
    #[error("return source holds {available} returns, {requested} requested")]
    DrawCount { requested: usize, available: usize },
}

/// Per-tick volatility for an annualized volatility.
pub fn tick_volatility(annual_vol: f64, ticks_per_year: usize) -> f64 {
    annual_vol / (ticks_per_year as f64).sqrt()
}

/// A source of per-tick simple returns.
pub trait ReturnSource {
    /// Produce `n` returns for a path whose per-tick volatility is `tick_vol`.
    fn draw(&mut self, n: usize, tick_vol: f64) -> Result<Vec<f64>, SimulationError>;
}

/// I.i.d. `N(0, tick_vol)` returns from an owned generator.
#[derive(Debug, Clone)]
pub struct GaussianReturns<R> {
    rng: R,
}

impl<R: Rng> GaussianReturns<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ReturnSource for GaussianReturns<R> {
    fn draw(&mut self, n: usize, tick_vol: f64) -> Result<Vec<f64>, SimulationError> {
        let normal = Normal::new(0.0, tick_vol).map_err(|e| SimulationError::Distribution {
            std_dev: tick_vol,
            reason: e.to_string(),
        })?;
        Ok((0..n).map(|_| normal.sample(&mut self.rng)).collect())
    }
}

/// Replays a prescribed return vector, ignoring `tick_vol`.
#[derive(Debug, Clone)]
pub struct FixedReturns {
    returns: Vec<f64>,
}

impl FixedReturns {
    pub fn new(returns: Vec<f64>) -> Self {
        Self { returns }
    }
}

impl ReturnSource for FixedReturns {
    fn draw(&mut self, n: usize, _tick_vol: f64) -> Result<Vec<f64>, SimulationError> {
        if n != self.returns.len() {
            return Err(SimulationError::DrawCount {
                requested: n,
                available: self.returns.len(),
            });
        }
        Ok(self.returns.clone())
    }
}

/// Compound returns into prices. `returns[0]` is discarded.
pub fn compound(start_price: f64, returns: &[f64]) -> Vec<f64> {
    let mut prices = Vec::with_capacity(returns.len());
    if returns.is_empty() {
        return prices;
    }
    prices.push(start_price);
    for r in &returns[1..] {
        let prev = prices[prices.len() - 1];
        prices.push(prev * (1.0 + r));
    }
    prices
}

/// Simulate one asset's path over `config.n_ticks()` ticks.
pub fn simulate_asset<S: ReturnSource + ?Sized>(
    config: &SimulationConfig,
    asset: &AssetSpec,
    source: &mut S,
) -> Result<PricePath, SimulationError> {
    let tick_vol = tick_volatility(asset.annual_volatility, config.ticks_per_year());
    let returns = source.draw(config.n_ticks(), tick_vol)?;
    let prices = compound(asset.start_price, &returns);
    tracing::debug!(
        asset = %asset.label,
        tick_vol,
        n = prices.len(),
        last = prices.last().copied().unwrap_or(asset.start_price),
        "simulated path"
    );
    Ok(PricePath {
        asset: asset.label.clone(),
        prices,
    })
}

/// Simulate every configured asset, each from its own generator stream.
pub fn simulate(
    config: &SimulationConfig,
    rngs: &RngSource,
) -> Result<BTreeMap<String, PricePath>, SimulationError> {
    let mut paths = BTreeMap::new();
    for asset in config.assets() {
        let mut source = GaussianReturns::new(rngs.rng_for(&asset.label));
        let path = simulate_asset(config, asset, &mut source)?;
        paths.insert(asset.label.clone(), path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationParams;

    fn four_tick_config() -> SimulationConfig {
        SimulationConfig::new(SimulationParams {
            n_day: 1,
            tick_duration_sec: 60,
            trading_day_sec: 240,
            assets: vec![AssetSpec::new("A", 100.0, 0.20)],
            ..SimulationParams::default()
        })
        .unwrap()
    }

    #[test]
    fn tick_vol_deannualizes_by_sqrt_ticks_per_year() {
        let v = tick_volatility(0.20, 252 * 420);
        assert!((v - 0.20 / (105_840.0_f64).sqrt()).abs() < 1e-15);
    }

    #[test]
    fn compound_discards_first_return() {
        let prices = compound(100.0, &[0.5, 0.01, -0.01, 0.02]);
        assert_eq!(prices.len(), 4);
        assert_eq!(prices[0], 100.0);
        assert!((prices[1] - 101.0).abs() < 1e-12);
        assert!((prices[2] - 99.99).abs() < 1e-12);
        assert!((prices[3] - 101.9898).abs() < 1e-12);
    }

    #[test]
    fn compound_of_empty_is_empty() {
        assert!(compound(100.0, &[]).is_empty());
    }

    #[test]
    fn fixed_returns_drive_simulation() {
        let config = four_tick_config();
        let mut source = FixedReturns::new(vec![0.0, 0.01, -0.01, 0.02]);
        let path = simulate_asset(&config, &config.assets()[0], &mut source).unwrap();
        assert_eq!(path.asset, "A");
        assert!((path.prices[3] - 101.9898).abs() < 1e-12);
    }

    #[test]
    fn fixed_returns_reject_wrong_length() {
        let config = four_tick_config();
        let mut source = FixedReturns::new(vec![0.0, 0.01]);
        assert_eq!(
            simulate_asset(&config, &config.assets()[0], &mut source),
            Err(SimulationError::DrawCount {
                requested: 4,
                available: 2
            })
        );
    }

    #[test]
    fn gaussian_rejects_invalid_std_dev() {
        let mut source = GaussianReturns::new(RngSource::from_seed(Some(1)).rng_for("A"));
        assert!(matches!(
            source.draw(4, f64::NAN),
            Err(SimulationError::Distribution { .. })
        ));
    }

    #[test]
    fn seeded_simulation_is_deterministic() {
        let config = SimulationConfig::new(SimulationParams::default()).unwrap();
        let rngs = RngSource::from_seed(Some(101));
        let a = simulate(&config, &rngs).unwrap();
        let b = simulate(&config, &rngs).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a["A"].len(), config.n_ticks());
        assert_eq!(a["A"].prices[0], 100.0);
    }

    #[test]
    fn assets_draw_independent_streams() {
        let config = SimulationConfig::new(SimulationParams {
            assets: vec![
                AssetSpec::new("A", 100.0, 0.20),
                AssetSpec::new("B", 100.0, 0.20),
            ],
            seed: Some(5),
            ..SimulationParams::default()
        })
        .unwrap();
        let paths = simulate(&config, &RngSource::from_seed(config.seed())).unwrap();
        assert_ne!(paths["A"].prices, paths["B"].prices);
    }
}
