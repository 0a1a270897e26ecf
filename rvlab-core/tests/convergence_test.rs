//! Statistical check: realized volatility recovers the input volatility.
//!
//! With 420 one-minute ticks per day the per-day estimate has a relative
//! standard error near `1 / sqrt(2 * 420)`, about 3.5%. Averaging 20 days
//! should land well inside a ±15% band for any seed.

use rvlab_core::calendar;
use rvlab_core::{
    derive_returns, estimate, group_by_day, per_asset_precision, per_day_precision, simulate,
    unpivot, InputVolatilities, ReturnSeries, RngSource, SimulationConfig, SimulationParams,
};

fn realized_for(seed: u64, n_day: usize) -> (SimulationConfig, Vec<rvlab_core::RealizedVolRecord>) {
    let config = SimulationConfig::new(SimulationParams {
        n_day,
        seed: Some(seed),
        ..SimulationParams::default()
    })
    .unwrap();
    let stamps = calendar::generate(&config);
    let paths = simulate(&config, &RngSource::from_seed(config.seed())).unwrap();
    let series: Vec<ReturnSeries> = paths
        .values()
        .map(|p| derive_returns(p, &stamps).unwrap())
        .collect();
    let groups = group_by_day(&unpivot(&series), config.n_tick_per_day()).unwrap();
    let realized = estimate(&groups, config.annualization());
    (config, realized)
}

#[test]
fn mean_realized_vol_within_fifteen_percent() {
    for seed in [101, 202, 303] {
        let (config, realized) = realized_for(seed, 20);
        let precision =
            per_asset_precision(&realized, &InputVolatilities::from_config(&config)).unwrap();
        assert_eq!(precision.len(), 2);
        for p in &precision {
            assert!(
                p.relative_error_pct.abs() < 15.0,
                "seed {seed} asset {}: avg={} input={} err={}%",
                p.asset,
                p.avg_realized_vol,
                p.input_vol,
                p.relative_error_pct
            );
        }
    }
}

#[test]
fn single_days_scatter_around_input() {
    let (config, realized) = realized_for(7, 10);
    let daily = per_day_precision(&realized, &InputVolatilities::from_config(&config)).unwrap();
    assert_eq!(daily.len(), 20);
    // Individual days are noisier than the average but still well inside ±30%.
    assert!(daily.iter().all(|d| d.error_pct.abs() < 30.0));
}

#[test]
fn error_shrinks_with_more_days() {
    let spread = |n_day: usize| -> f64 {
        let errors: Vec<f64> = (0..8u64)
            .map(|seed| {
                let (config, realized) = realized_for(1_000 + seed, n_day);
                per_asset_precision(&realized, &InputVolatilities::from_config(&config))
                    .unwrap()
                    .iter()
                    .map(|p| (p.avg_realized_vol - p.input_vol) / p.input_vol)
                    .map(|e| e * e)
                    .sum::<f64>()
            })
            .collect();
        (errors.iter().sum::<f64>() / errors.len() as f64).sqrt()
    };
    assert!(spread(40) < spread(2));
}
