//! TickStamp — one point on the simulated intraday timeline.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A timestamp produced by the calendar, tagged with its position in the
/// series and the simulated day it belongs to.
///
/// `day` is assigned by the calendar from its generation order. It is never
/// re-derived from `at`, so two simulated days sharing a wall-clock date
/// still land in separate day groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStamp {
    pub index: usize,
    pub day: usize,
    pub at: NaiveDateTime,
}

impl TickStamp {
    pub fn date(&self) -> NaiveDate {
        self.at.date()
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.at.time()
    }
}
