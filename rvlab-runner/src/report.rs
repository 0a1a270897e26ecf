//! Report rendering — text tables, CSV and JSON.
//!
//! Tables mirror the pipeline stages: prices and returns, long-form squared
//! returns, grouped day lists, the exploded cumulative series, realized
//! volatility, and the two precision views. Column names and rounding are
//! fixed: 4 decimals for volatilities and error ratios, 2 for percentages.

use std::fmt::Write as _;

use serde::Serialize;
use thiserror::Error;

use rvlab_core::precision::{AssetPrecision, DailyPrecision};
use rvlab_core::RealizedVolRecord;

use crate::convergence::ConvergenceReport;
use crate::pipeline::HarnessReport;

/// Errors while rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Which tables to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSelection {
    /// All five pipeline tables plus both precision tables.
    All,
    /// Realized volatility and the two precision tables.
    Summary,
}

/// Rows shown before eliding the middle of a long table.
pub const DEFAULT_MAX_ROWS: usize = 10;

/// A rectangular table of pre-formatted cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Render as a boxed text table, eliding middle rows past `max_rows`.
    pub fn render(&self, max_rows: usize) -> String {
        let visible = visible_rows(&self.rows, max_rows);
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in visible.iter().flatten() {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let line = |left: char, fill: char, sep: char, right: char| -> String {
            let mut s = String::new();
            s.push(left);
            for (i, w) in widths.iter().enumerate() {
                if i > 0 {
                    s.push(sep);
                }
                s.extend(std::iter::repeat(fill).take(w + 2));
            }
            s.push(right);
            s
        };
        let cells = |values: &[String]| -> String {
            let mut s = String::from("│");
            for (i, w) in widths.iter().enumerate() {
                if i > 0 {
                    s.push('┆');
                }
                let v = values.get(i).map(String::as_str).unwrap_or("");
                let pad = w.saturating_sub(v.chars().count());
                s.push(' ');
                s.push_str(v);
                s.extend(std::iter::repeat(' ').take(pad + 1));
            }
            s.push('│');
            s
        };
        let ellipsis: Vec<String> = widths.iter().map(|_| "…".to_string()).collect();

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "shape: ({}, {})", self.rows.len(), self.headers.len());
        let _ = writeln!(out, "{}", line('┌', '─', '┬', '┐'));
        let _ = writeln!(out, "{}", cells(self.headers.as_slice()));
        let _ = writeln!(out, "{}", line('╞', '═', '╪', '╡'));
        for row in &visible {
            match row {
                Some(r) => {
                    let _ = writeln!(out, "{}", cells(r.as_slice()));
                }
                None => {
                    let _ = writeln!(out, "{}", cells(ellipsis.as_slice()));
                }
            }
        }
        let _ = writeln!(out, "{}", line('└', '─', '┴', '┘'));
        out
    }

    /// Render as CSV with a header row. Nothing is elided.
    pub fn to_csv(&self) -> Result<String, ReportError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// `None` marks the elided middle section.
fn visible_rows(rows: &[Vec<String>], max_rows: usize) -> Vec<Option<&Vec<String>>> {
    if rows.len() <= max_rows {
        return rows.iter().map(Some).collect();
    }
    let head = max_rows.div_ceil(2);
    let tail = max_rows / 2;
    rows[..head]
        .iter()
        .map(Some)
        .chain(std::iter::once(None))
        .chain(rows[rows.len() - tail..].iter().map(Some))
        .collect()
}

fn fmt_f(value: f64, dp: usize) -> String {
    format!("{value:.dp$}")
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| format!("{v:.6}"))
}

/// Preview of a list column: first three values and the length.
fn fmt_list<T, F: Fn(&T) -> String>(values: &[T], f: F) -> String {
    let shown: Vec<String> = values.iter().take(3).map(&f).collect();
    if values.len() > 3 {
        format!("[{}, … {} items]", shown.join(", "), values.len())
    } else {
        format!("[{}]", shown.join(", "))
    }
}

// ─── Pipeline tables ────────────────────────────────────────────────

/// Wide price/return table: one row per tick, four columns per asset.
pub fn price_table(report: &HarnessReport) -> Table {
    let mut headers = vec!["date".to_string()];
    for s in &report.returns {
        for prefix in ["spot", "ret", "log_ret", "ret_sq"] {
            headers.push(format!("{prefix}_{}", s.asset));
        }
    }
    let mut table = Table {
        title: "Prices and returns".into(),
        headers,
        rows: Vec::new(),
    };

    let n = report.returns.first().map_or(0, |s| s.records.len());
    for i in 0..n {
        let mut row = vec![report.returns[0].records[i].stamp.at.to_string()];
        for s in &report.returns {
            let r = &s.records[i];
            row.push(fmt_f(r.price, 6));
            row.push(fmt_opt(r.ret));
            row.push(fmt_opt(r.log_ret));
            row.push(format!("{:.8}", r.ret_sq));
        }
        table.push(row);
    }
    table
}

pub fn squared_returns_table(report: &HarnessReport) -> Table {
    let mut table = Table::new(
        "Squared returns (long form)",
        &["date", "undl", "ret_sq", "day", "time"],
    );
    for r in &report.squared_returns {
        table.push(vec![
            r.stamp.at.to_string(),
            r.asset.clone(),
            format!("{:.8}", r.ret_sq),
            r.stamp.day.to_string(),
            r.stamp.time_of_day().to_string(),
        ]);
    }
    table
}

pub fn day_groups_table(report: &HarnessReport) -> Table {
    let mut table = Table::new(
        "Squared returns by day",
        &["day", "undl", "time", "ret_sq", "ret_sq_cum_sum"],
    );
    for g in &report.day_groups {
        table.push(vec![
            g.day.to_string(),
            g.asset.clone(),
            fmt_list(&g.times, |t| t.to_string()),
            fmt_list(&g.ret_sq, |v| format!("{v:.8}")),
            fmt_list(&g.cum_sum, |v| format!("{v:.8}")),
        ]);
    }
    table
}

pub fn cumulative_table(report: &HarnessReport) -> Table {
    let mut table = Table::new(
        "Cumulative squared returns",
        &["day", "undl", "time", "ret_sq_cum_sum"],
    );
    for p in &report.cumulative {
        table.push(vec![
            p.day.to_string(),
            p.asset.clone(),
            p.time.to_string(),
            format!("{:.8}", p.cum_sum),
        ]);
    }
    table
}

pub fn realized_table(records: &[RealizedVolRecord]) -> Table {
    let mut table = Table::new("Realized volatility", &["day", "undl", "n_tick", "vol_rea"]);
    for r in records {
        table.push(vec![
            r.day.to_string(),
            r.asset.clone(),
            r.n_tick.to_string(),
            fmt_f(r.vol_rea, 6),
        ]);
    }
    table
}

pub fn asset_precision_table(rows: &[AssetPrecision]) -> Table {
    let mut table = Table::new(
        "Volatility Precision Metrics",
        &[
            "undl",
            "avg_realized_vol",
            "input_vol",
            "absolute_error",
            "relative_error",
            "relative_error_pct",
        ],
    );
    for p in rows {
        table.push(vec![
            p.asset.clone(),
            fmt_f(p.avg_realized_vol, 6),
            p.input_vol.to_string(),
            fmt_f(p.absolute_error, 4),
            fmt_f(p.relative_error, 4),
            fmt_f(p.relative_error_pct, 2),
        ]);
    }
    table
}

pub fn daily_precision_table(rows: &[DailyPrecision]) -> Table {
    let mut table = Table::new(
        "Volatility by Day vs Input",
        &["day", "undl", "vol_rea", "input_vol", "error_pct"],
    );
    for p in rows {
        table.push(vec![
            p.day.to_string(),
            p.asset.clone(),
            fmt_f(p.vol_rea, 4),
            p.input_vol.to_string(),
            fmt_f(p.error_pct, 2),
        ]);
    }
    table
}

/// Tables for a harness report, in pipeline order.
pub fn harness_tables(report: &HarnessReport, selection: TableSelection) -> Vec<Table> {
    let mut tables = Vec::new();
    if selection == TableSelection::All {
        tables.push(price_table(report));
        tables.push(squared_returns_table(report));
        tables.push(day_groups_table(report));
        tables.push(cumulative_table(report));
    }
    tables.push(realized_table(&report.realized));
    tables.push(asset_precision_table(&report.asset_precision));
    tables.push(daily_precision_table(&report.daily_precision));
    tables
}

pub fn convergence_table(report: &ConvergenceReport) -> Table {
    let mut table = Table::new(
        format!(
            "Convergence over {} trials (master seed {}, tolerance ±{}%)",
            report.trials, report.master_seed, report.tolerance_pct
        ),
        &[
            "undl",
            "input_vol",
            "mean_realized_vol",
            "std_realized_vol",
            "mean_relative_error_pct",
            "worst_relative_error_pct",
            "within_tolerance",
        ],
    );
    for a in &report.assets {
        table.push(vec![
            a.asset.clone(),
            a.input_vol.to_string(),
            fmt_f(a.mean_realized_vol, 4),
            fmt_f(a.std_realized_vol, 4),
            fmt_f(a.mean_relative_error_pct, 2),
            fmt_f(a.worst_relative_error_pct, 2),
            a.within_tolerance.to_string(),
        ]);
    }
    table
}

// ─── Encoders ───────────────────────────────────────────────────────

/// Summary view serialized for `--tables summary --format json`.
#[derive(Serialize)]
struct SummaryJson<'a> {
    schema_version: u32,
    run_id: &'a str,
    seed: Option<u64>,
    n_day: usize,
    n_tick_per_day: usize,
    realized: &'a [RealizedVolRecord],
    asset_precision: &'a [AssetPrecision],
    daily_precision: &'a [DailyPrecision],
}

/// Encode a harness report in the requested format.
pub fn render_harness(
    report: &HarnessReport,
    format: OutputFormat,
    selection: TableSelection,
    max_rows: usize,
) -> Result<String, ReportError> {
    match format {
        OutputFormat::Json => match selection {
            TableSelection::All => Ok(serde_json::to_string_pretty(report)?),
            TableSelection::Summary => Ok(serde_json::to_string_pretty(&SummaryJson {
                schema_version: report.schema_version,
                run_id: &report.run_id,
                seed: report.seed,
                n_day: report.n_day,
                n_tick_per_day: report.n_tick_per_day,
                realized: &report.realized,
                asset_precision: &report.asset_precision,
                daily_precision: &report.daily_precision,
            })?),
        },
        OutputFormat::Table => {
            let mut out = harness_header(report);
            for table in harness_tables(report, selection) {
                out.push('\n');
                out.push_str(&table.render(max_rows));
            }
            Ok(out)
        }
        OutputFormat::Csv => render_csv_sections(&harness_tables(report, selection)),
    }
}

/// Encode a convergence report in the requested format.
pub fn render_convergence(
    report: &ConvergenceReport,
    format: OutputFormat,
) -> Result<String, ReportError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Table => Ok(convergence_table(report).render(usize::MAX)),
        OutputFormat::Csv => convergence_table(report).to_csv(),
    }
}

fn harness_header(report: &HarnessReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "run_id={}", report.run_id);
    match report.seed {
        Some(seed) => {
            let _ = writeln!(out, "seed={seed}");
        }
        None => {
            let _ = writeln!(out, "seed=none (not reproducible)");
        }
    }
    for a in &report.assets {
        let _ = writeln!(out, "vol_{}={}", a.label, a.annual_volatility);
    }
    let _ = writeln!(out, "n_tick_per_day={}", report.n_tick_per_day);
    out
}

/// Concatenate tables as CSV, each preceded by a `# title` line.
fn render_csv_sections(tables: &[Table]) -> Result<String, ReportError> {
    let mut out = String::new();
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "# {}", table.title);
        out.push_str(&table.to_csv()?);
    }
    Ok(out)
}
