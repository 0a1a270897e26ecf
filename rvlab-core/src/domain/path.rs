//! PricePath — a simulated price series for one asset.

use serde::{Deserialize, Serialize};

/// Ordered prices for one asset, aligned index-for-index with the calendar.
///
/// `prices[0]` is the asset's start price; every later price is the previous
/// one compounded by that tick's simple return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePath {
    pub asset: String,
    pub prices: Vec<f64>,
}

impl PricePath {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// True if every price is finite and strictly positive.
    pub fn is_positive(&self) -> bool {
        self.prices.iter().all(|p| p.is_finite() && *p > 0.0)
    }
}
