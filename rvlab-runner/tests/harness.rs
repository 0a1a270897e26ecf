//! Integration tests for the harness: config files, full runs, rendering,
//! and the convergence study.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use rvlab_core::{AssetSpec, SimulationConfig, SimulationParams};
use rvlab_runner::{
    render_convergence, render_harness, run_convergence, run_harness, run_with_returns,
    ConvergenceParams, HarnessConfig, OutputFormat, TableSelection, DEFAULT_MAX_ROWS,
};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_config(contents: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "rvlab_runner_harness_{}_{id}.toml",
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

fn seeded(seed: u64, n_day: usize) -> SimulationConfig {
    SimulationConfig::new(SimulationParams {
        n_day,
        seed: Some(seed),
        ..SimulationParams::default()
    })
    .unwrap()
}

fn four_tick_config() -> SimulationConfig {
    SimulationConfig::new(SimulationParams {
        n_day: 1,
        tick_duration_sec: 60,
        trading_day_sec: 240,
        assets: vec![AssetSpec::new("A", 100.0, 0.20)],
        seed: Some(1),
        ..SimulationParams::default()
    })
    .unwrap()
}

#[test]
fn config_file_drives_a_run() {
    let path = temp_config(
        r#"
[simulation]
n_day = 2
seed = 99

[[simulation.assets]]
label = "X"
start_price = 50.0
annual_volatility = 0.30
"#,
    );
    let harness = HarnessConfig::from_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let config = harness.simulation_config().unwrap();
    assert_eq!(config.n_tick_per_day(), 420);
    let report = run_harness(&config).unwrap();
    assert_eq!(report.run_id, harness.run_id());
    assert_eq!(report.asset_precision.len(), 1);
    assert_eq!(report.asset_precision[0].asset, "X");
    assert_eq!(report.realized.len(), 2);
}

#[test]
fn missing_config_file_is_io_error() {
    let err = HarnessConfig::from_file(&PathBuf::from("/nonexistent/rvlab.toml"));
    assert!(matches!(err, Err(rvlab_runner::ConfigError::Io { .. })));
}

#[test]
fn demo_harness_file_parses() {
    let harness = HarnessConfig::from_toml(include_str!("../../demos/harness.toml")).unwrap();
    assert_eq!(harness.simulation.n_day, 20);
    assert_eq!(harness.simulation.seed, Some(101));
    assert_eq!(harness.convergence.trials, 64);
    let config = harness.simulation_config().unwrap();
    assert_eq!(config.assets().len(), 2);
}

#[test]
fn seeded_runs_are_reproducible() {
    let config = seeded(2024, 3);
    let a = run_harness(&config).unwrap();
    let b = run_harness(&config).unwrap();
    assert_eq!(a.returns, b.returns);
    assert_eq!(a.realized, b.realized);
    assert_eq!(a.asset_precision, b.asset_precision);

    let json_a = render_harness(&a, OutputFormat::Json, TableSelection::All, 0).unwrap();
    let json_b = render_harness(&b, OutputFormat::Json, TableSelection::All, 0).unwrap();
    assert_eq!(json_a, json_b);
}

#[test]
fn different_seeds_differ() {
    let a = run_harness(&seeded(1, 1)).unwrap();
    let b = run_harness(&seeded(2, 1)).unwrap();
    assert_ne!(a.realized, b.realized);
}

#[test]
fn prescribed_returns_reproduce_four_tick_scenario() {
    let config = four_tick_config();
    let returns = BTreeMap::from([("A".to_string(), vec![0.0, 0.01, -0.01, 0.02])]);
    let report = run_with_returns(&config, &returns).unwrap();

    let cum: Vec<f64> = report.cumulative.iter().map(|p| p.cum_sum).collect();
    let expected = [0.0, 0.0001, 0.0002, 0.0006];
    for (a, e) in cum.iter().zip(expected) {
        assert!((a - e).abs() < 1e-12, "actual={a}, expected={e}");
    }
    assert!((report.realized[0].vol_rea - 0.1512_f64.sqrt()).abs() < 1e-12);
    assert_eq!(report.daily_precision[0].vol_rea, 0.3888);

    let text = render_harness(
        &report,
        OutputFormat::Table,
        TableSelection::All,
        DEFAULT_MAX_ROWS,
    )
    .unwrap();
    assert!(text.contains("spot_A"));
    assert!(text.contains("null"));
    assert!(text.contains("ret_sq_cum_sum"));
    assert!(text.contains("Volatility Precision Metrics"));
    assert!(text.contains("Volatility by Day vs Input"));
    assert!(text.contains("0.388844"));
    assert!(text.contains("94.42"));
}

#[test]
fn summary_json_carries_precision_tables_only() {
    let report = run_harness(&seeded(5, 2)).unwrap();
    let json = render_harness(&report, OutputFormat::Json, TableSelection::Summary, 0).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["seed"], 5);
    assert_eq!(value["asset_precision"].as_array().unwrap().len(), 2);
    assert_eq!(value["daily_precision"].as_array().unwrap().len(), 4);
    assert!(value.get("returns").is_none());
}

#[test]
fn csv_sections_emit_every_row() {
    let report = run_harness(&seeded(5, 1)).unwrap();
    let csv = render_harness(&report, OutputFormat::Csv, TableSelection::Summary, 0).unwrap();
    assert!(csv.starts_with("# Realized volatility\nday,undl,n_tick,vol_rea\n"));
    assert!(csv.contains("# Volatility Precision Metrics"));
    assert!(csv.contains(
        "undl,avg_realized_vol,input_vol,absolute_error,relative_error,relative_error_pct"
    ));
    assert!(csv.contains("# Volatility by Day vs Input\nday,undl,vol_rea,input_vol,error_pct\n"));
}

#[test]
fn convergence_study_recovers_input_volatility() {
    let config = seeded(0, 5);
    let params = ConvergenceParams {
        trials: 8,
        tolerance_pct: 15.0,
    };
    let report = run_convergence(&config, &params, 42).unwrap();
    assert_eq!(report.outcomes.len(), 16);
    assert_eq!(report.assets.len(), 2);
    assert!(report.all_within_tolerance());
    for a in &report.assets {
        assert_eq!(a.trials, 8);
        assert!(a.std_realized_vol > 0.0);
        assert!(a.mean_relative_error_pct.abs() < 5.0);
    }

    let again = run_convergence(&config, &params, 42).unwrap();
    assert_eq!(report.assets, again.assets);

    let table = render_convergence(&report, OutputFormat::Table).unwrap();
    assert!(table.contains("mean_relative_error_pct"));
    assert!(table.contains("master seed 42"));
}
