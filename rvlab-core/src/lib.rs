//! RVLab Core — path simulation and realized-volatility estimation.
//!
//! This crate contains the numerical pipeline:
//! - Validated simulation configuration and the intraday calendar
//! - Per-asset generator streams (BLAKE3-derived seeds)
//! - Path simulation under i.i.d. normal per-tick returns
//! - Return derivation with an explicit no-prior-price sentinel
//! - Per-(day, asset) aggregation of squared returns into cumulative sums
//! - Annualized realized volatility and precision versus the input volatility

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod estimator;
pub mod precision;
pub mod returns;
pub mod rng;
pub mod simulate;

pub use aggregate::{explode, group_by_day, unpivot, CumulativePoint, DayGroup, SquaredReturnRow};
pub use calendar::{validate_alignment, AlignmentError};
pub use config::{ConfigError, SimulationConfig, SimulationParams};
pub use domain::{AssetSpec, PricePath, TickStamp};
pub use estimator::{estimate, realized_volatility, AnnualizationBasis, RealizedVolRecord};
pub use precision::{
    per_asset_precision, per_day_precision, round_dp, AssetPrecision, DailyPrecision,
    InputVolatilities, LookupError,
};
pub use returns::{derive_returns, ReturnRecord, ReturnSeries};
pub use rng::{RngHierarchy, RngSource};
pub use simulate::{
    compound, simulate, simulate_asset, tick_volatility, FixedReturns, GaussianReturns,
    ReturnSource, SimulationError,
};
