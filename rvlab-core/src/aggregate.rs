//! Day aggregation of squared returns.
//!
//! Squared returns are flattened into long form, grouped by
//! `(day, asset)` in an ordered map, and scanned into a running sum that
//! starts afresh at the first tick of every group. Quadratic variation never
//! accumulates across a day boundary.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::calendar::AlignmentError;
use crate::domain::TickStamp;
use crate::returns::ReturnSeries;

/// Long-form squared return: one row per (tick, asset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquaredReturnRow {
    pub stamp: TickStamp,
    pub asset: String,
    pub ret_sq: f64,
}

/// All ticks of one asset on one simulated day, in tick order.
///
/// `date` is the session's opening date; a session may run past midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayGroup {
    pub day: usize,
    pub date: NaiveDate,
    pub asset: String,
    pub times: Vec<NaiveTime>,
    pub ret_sq: Vec<f64>,
    /// Running sum of `ret_sq`; `cum_sum[k] = ret_sq[0] + .. + ret_sq[k]`.
    pub cum_sum: Vec<f64>,
}

impl DayGroup {
    pub fn n_tick(&self) -> usize {
        self.ret_sq.len()
    }

    /// Quadratic variation accumulated by the end of the day.
    pub fn terminal_sum(&self) -> f64 {
        self.cum_sum.last().copied().unwrap_or(0.0)
    }
}

/// One point of a flattened cumulative series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub day: usize,
    pub asset: String,
    pub time: NaiveTime,
    pub cum_sum: f64,
}

/// Flatten per-asset return series into long form, ordered by tick then asset.
pub fn unpivot(series: &[ReturnSeries]) -> Vec<SquaredReturnRow> {
    let mut rows: Vec<SquaredReturnRow> = series
        .iter()
        .flat_map(|s| {
            s.records.iter().map(move |r| SquaredReturnRow {
                stamp: r.stamp,
                asset: s.asset.clone(),
                ret_sq: r.ret_sq,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.stamp
            .index
            .cmp(&b.stamp.index)
            .then_with(|| a.asset.cmp(&b.asset))
    });
    rows
}

/// Group long-form rows by `(day, asset)` and build cumulative sums.
///
/// Groups come back ordered by day, then asset label. Every group must hold
/// exactly `expected_ticks` ticks.
pub fn group_by_day(
    rows: &[SquaredReturnRow],
    expected_ticks: usize,
) -> Result<Vec<DayGroup>, AlignmentError> {
    let mut buckets: BTreeMap<(usize, &str), Vec<&SquaredReturnRow>> = BTreeMap::new();
    for row in rows {
        buckets
            .entry((row.stamp.day, row.asset.as_str()))
            .or_default()
            .push(row);
    }

    let mut groups = Vec::with_capacity(buckets.len());
    for ((day, asset), mut ticks) in buckets {
        if ticks.len() != expected_ticks {
            return Err(AlignmentError::DayCardinality {
                day,
                expected: expected_ticks,
                actual: ticks.len(),
            });
        }
        ticks.sort_by_key(|r| r.stamp.index);

        let ret_sq: Vec<f64> = ticks.iter().map(|r| r.ret_sq).collect();
        let cum_sum = running_sum(&ret_sq);
        groups.push(DayGroup {
            day,
            date: ticks[0].stamp.date(),
            asset: asset.to_string(),
            times: ticks.iter().map(|r| r.stamp.time_of_day()).collect(),
            ret_sq,
            cum_sum,
        });
    }
    tracing::debug!(groups = groups.len(), "grouped squared returns by day");
    Ok(groups)
}

/// Flatten grouped cumulative series into one row per tick.
pub fn explode(groups: &[DayGroup]) -> Vec<CumulativePoint> {
    groups
        .iter()
        .flat_map(|g| {
            g.times
                .iter()
                .zip(&g.cum_sum)
                .map(move |(&time, &cum_sum)| CumulativePoint {
                    day: g.day,
                    asset: g.asset.clone(),
                    time,
                    cum_sum,
                })
        })
        .collect()
}

fn running_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}
