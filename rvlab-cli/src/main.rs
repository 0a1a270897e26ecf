//! RVLab CLI — realized-volatility validation harness.
//!
//! Commands:
//! - `run` — simulate paths, estimate realized volatility, print the tables
//! - `convergence` — repeat the run over many seeds and summarize the error
//! - `config` — print the default harness file

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rvlab_runner::{
    render_convergence, render_harness, run_convergence, run_harness, HarnessConfig,
    OutputFormat, TableSelection, DEFAULT_MAX_ROWS,
};

#[derive(Parser)]
#[command(
    name = "rvlab",
    about = "RVLab CLI — simulate intraday paths and validate realized volatility"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate, estimate, and print the pipeline tables.
    Run {
        /// Path to a TOML harness file. Defaults to the built-in harness.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Master seed. Overrides the config; omit both for a non-reproducible run.
        #[arg(long)]
        seed: Option<u64>,

        /// Number of simulated days. Overrides the config.
        #[arg(long)]
        days: Option<usize>,

        /// Output encoding.
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Which tables to print.
        #[arg(long, value_enum, default_value_t = Tables::All)]
        tables: Tables,

        /// Rows shown per text table before eliding the middle.
        #[arg(long, default_value_t = DEFAULT_MAX_ROWS)]
        max_rows: usize,
    },
    /// Run many independent seeded trials and summarize estimator precision.
    Convergence {
        /// Path to a TOML harness file. Defaults to the built-in harness.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of trials. Overrides the config.
        #[arg(long)]
        trials: Option<usize>,

        /// Master seed for deriving trial seeds. Defaults to the config seed, else random.
        #[arg(long)]
        seed: Option<u64>,

        /// Acceptance band for the mean relative error, in percent.
        #[arg(long)]
        tolerance: Option<f64>,

        /// Number of simulated days per trial. Overrides the config.
        #[arg(long)]
        days: Option<usize>,

        /// Output encoding.
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Print the default harness file as TOML.
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Table => OutputFormat::Table,
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Tables {
    All,
    Summary,
}

impl From<Tables> for TableSelection {
    fn from(t: Tables) -> Self {
        match t {
            Tables::All => TableSelection::All,
            Tables::Summary => TableSelection::Summary,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            seed,
            days,
            format,
            tables,
            max_rows,
        } => run_cmd(config.as_deref(), seed, days, format, tables, max_rows),
        Commands::Convergence {
            config,
            trials,
            seed,
            tolerance,
            days,
            format,
        } => convergence_cmd(config.as_deref(), trials, seed, tolerance, days, format),
        Commands::Config => {
            let rendered = HarnessConfig::default()
                .to_toml()
                .context("failed to render default config")?;
            print!("{rendered}");
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("rvlab={default_level},rvlab_core={default_level},rvlab_runner={default_level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_harness(path: Option<&Path>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("failed to load harness config {}", path.display())),
        None => Ok(HarnessConfig::default()),
    }
}

fn run_cmd(
    config_path: Option<&Path>,
    seed: Option<u64>,
    days: Option<usize>,
    format: Format,
    tables: Tables,
    max_rows: usize,
) -> Result<()> {
    let mut harness = load_harness(config_path)?;
    if seed.is_some() {
        harness.simulation.seed = seed;
    }
    if let Some(days) = days {
        harness.simulation.n_day = days;
    }
    let config = harness.simulation_config()?;
    info!(
        run_id = %harness.run_id(),
        n_day = config.n_day(),
        n_tick_per_day = config.n_tick_per_day(),
        "running harness"
    );

    let report = run_harness(&config)?;
    let rendered = render_harness(&report, format.into(), tables.into(), max_rows)?;
    println!("{rendered}");
    Ok(())
}

fn convergence_cmd(
    config_path: Option<&Path>,
    trials: Option<usize>,
    seed: Option<u64>,
    tolerance: Option<f64>,
    days: Option<usize>,
    format: Format,
) -> Result<()> {
    let mut harness = load_harness(config_path)?;
    if let Some(trials) = trials {
        harness.convergence.trials = trials;
    }
    if let Some(tolerance) = tolerance {
        harness.convergence.tolerance_pct = tolerance;
    }
    if let Some(days) = days {
        harness.simulation.n_day = days;
    }
    let config = harness.simulation_config()?;

    let master_seed = seed
        .or(harness.simulation.seed)
        .unwrap_or_else(rand_seed);
    let report = run_convergence(&config, &harness.convergence, master_seed)?;
    println!("{}", render_convergence(&report, format.into())?);

    if !report.all_within_tolerance() {
        bail!(
            "mean realized volatility outside ±{}% for at least one asset",
            report.tolerance_pct
        );
    }
    Ok(())
}

fn rand_seed() -> u64 {
    let seed = rand::random::<u64>();
    info!(master_seed = seed, "no seed given; drew one for this study");
    seed
}
