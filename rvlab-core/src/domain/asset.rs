//! Asset — a simulated underlying with its generating parameters.

use serde::{Deserialize, Serialize};

/// One simulated underlying, identified by its label.
///
/// The start price and annualized volatility are fixed for the whole run;
/// the volatility is the "true" value the estimator is checked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub label: String,
    pub start_price: f64,
    pub annual_volatility: f64,
}

impl AssetSpec {
    pub fn new(label: impl Into<String>, start_price: f64, annual_volatility: f64) -> Self {
        Self {
            label: label.into(),
            start_price,
            annual_volatility,
        }
    }
}
