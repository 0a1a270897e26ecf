//! RVLab Runner — harness orchestration, convergence study, reports.
//!
//! This crate builds on `rvlab-core` to provide:
//! - TOML harness files with run fingerprinting
//! - The end-to-end pipeline, parallel across assets
//! - Multi-trial convergence studies, parallel across trials
//! - Text table, CSV and JSON report rendering

pub mod config;
pub mod convergence;
pub mod pipeline;
pub mod report;

pub use config::{run_id_for, ConfigError, ConvergenceParams, HarnessConfig, RunId};
pub use convergence::{run_convergence, AssetConvergence, ConvergenceReport, TrialOutcome};
pub use pipeline::{
    run_from_paths, run_harness, run_with_returns, simulate_parallel, HarnessReport, RunError,
    SCHEMA_VERSION,
};
pub use report::{
    render_convergence, render_harness, OutputFormat, ReportError, Table, TableSelection,
    DEFAULT_MAX_ROWS,
};
