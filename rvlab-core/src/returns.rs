//! Return derivation.
//!
//! Tick `i` carries the simple and log return from tick `i-1`. Only the
//! first tick of the whole series has no prior price; its returns are
//! `None`, and its squared return is zero-filled so it contributes nothing
//! to quadratic variation. Day boundaries do not reset this: the first tick
//! of day 1 has a return against the last tick of day 0.

use serde::{Deserialize, Serialize};

use crate::calendar::AlignmentError;
use crate::domain::{PricePath, TickStamp};

/// One tick of one asset's return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub stamp: TickStamp,
    pub price: f64,
    /// `price[i] / price[i-1] - 1`; `None` when there is no prior price.
    pub ret: Option<f64>,
    /// `ln(price[i] / price[i-1])`; `None` when there is no prior price.
    pub log_ret: Option<f64>,
    /// `ret^2`, or `0.0` when `ret` is `None`.
    pub ret_sq: f64,
}

/// Ordered return records for a single asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub asset: String,
    pub records: Vec<ReturnRecord>,
}

/// Squared simple return with the zero-fill policy for the leading tick.
pub fn squared_return(ret: Option<f64>) -> f64 {
    let r = ret.unwrap_or(0.0);
    r * r
}

/// Derive returns for one asset's path against the calendar.
pub fn derive_returns(
    path: &PricePath,
    stamps: &[TickStamp],
) -> Result<ReturnSeries, AlignmentError> {
    if path.len() != stamps.len() {
        return Err(AlignmentError::PathLength {
            asset: path.asset.clone(),
            expected: stamps.len(),
            actual: path.len(),
        });
    }

    let mut prev: Option<f64> = None;
    let records = stamps
        .iter()
        .zip(&path.prices)
        .map(|(stamp, &price)| {
            let ratio = prev.map(|p| price / p);
            prev = Some(price);
            let ret = ratio.map(|x| x - 1.0);
            ReturnRecord {
                stamp: *stamp,
                price,
                ret,
                log_ret: ratio.map(f64::ln),
                ret_sq: squared_return(ret),
            }
        })
        .collect();

    Ok(ReturnSeries {
        asset: path.asset.clone(),
        records,
    })
}
