//! Domain types for RVLab

pub mod asset;
pub mod path;
pub mod tick;

pub use asset::AssetSpec;
pub use path::PricePath;
pub use tick::TickStamp;
