//! Intraday calendar.
//!
//! Produces the tick timeline the simulator aligns prices to: `n_day`
//! sessions of `n_tick_per_day` ticks, day `d` starting at
//! `start_date + d days + day_start_hour hours`, ticks spaced by
//! `tick_duration_sec`.

use chrono::{Duration, NaiveTime};
use thiserror::Error;

use crate::config::SimulationConfig;
use crate::domain::TickStamp;

/// Contract violations between the calendar and the rest of the pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum AlignmentError {
    #[error("expected {expected} timestamps, got {actual}")]
    TickCount { expected: usize, actual: usize },
    #[error("day {day} has {actual} ticks, expected {expected}")]
    DayCardinality {
        day: usize,
        expected: usize,
        actual: usize,
    },
    #[error("tick {index} carries day {day}, expected day {expected}")]
    DayIndex {
        index: usize,
        day: usize,
        expected: usize,
    },
    #[error("timestamp at tick {index} does not increase on the previous tick")]
    NotIncreasing { index: usize },
    #[error("price path for '{asset}' has {actual} prices for {expected} timestamps")]
    PathLength {
        asset: String,
        expected: usize,
        actual: usize,
    },
}

/// Generate the full tick timeline for a configuration.
pub fn generate(config: &SimulationConfig) -> Vec<TickStamp> {
    let n_tick_per_day = config.n_tick_per_day();
    let origin = config.start_date().and_time(NaiveTime::MIN);
    let tick = config.tick_duration_sec() as i64;
    let open = Duration::hours(config.day_start_hour() as i64);

    let mut stamps = Vec::with_capacity(config.n_ticks());
    for day in 0..config.n_day() {
        let session_open = origin + Duration::days(day as i64) + open;
        for i in 0..n_tick_per_day {
            stamps.push(TickStamp {
                index: stamps.len(),
                day,
                at: session_open + Duration::seconds(i as i64 * tick),
            });
        }
    }
    tracing::debug!(
        n_day = config.n_day(),
        n_tick_per_day,
        n = stamps.len(),
        "generated calendar"
    );
    stamps
}

/// Verify a timeline matches the shape downstream aggregation assumes.
///
/// Checks total count, contiguous day indices with exactly
/// `n_tick_per_day` ticks each, consecutive tick indices, and strictly
/// increasing timestamps.
pub fn validate_alignment(
    stamps: &[TickStamp],
    n_day: usize,
    n_tick_per_day: usize,
) -> Result<(), AlignmentError> {
    if n_tick_per_day == 0 {
        return Err(AlignmentError::DayCardinality {
            day: 0,
            expected: 0,
            actual: stamps.len(),
        });
    }
    let expected = n_day * n_tick_per_day;
    if stamps.len() != expected {
        return Err(AlignmentError::TickCount {
            expected,
            actual: stamps.len(),
        });
    }

    for (day, chunk) in stamps.chunks(n_tick_per_day).enumerate() {
        let in_day = chunk.iter().filter(|s| s.day == day).count();
        if in_day != n_tick_per_day {
            return Err(AlignmentError::DayCardinality {
                day,
                expected: n_tick_per_day,
                actual: in_day,
            });
        }
    }

    for (i, pair) in stamps.windows(2).enumerate() {
        if pair[1].at <= pair[0].at {
            return Err(AlignmentError::NotIncreasing { index: i + 1 });
        }
    }

    for (i, stamp) in stamps.iter().enumerate() {
        let expected_day = i / n_tick_per_day;
        if stamp.index != i || stamp.day != expected_day {
            return Err(AlignmentError::DayIndex {
                index: i,
                day: stamp.day,
                expected: expected_day,
            });
        }
    }

    Ok(())
}
