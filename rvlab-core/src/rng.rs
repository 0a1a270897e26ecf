//! Per-asset generator streams.
//!
//! Every asset draws from its own generator. Seeded runs derive each
//! asset's seed from the master seed, the asset label and a trial index by
//! BLAKE3 hashing, so streams are independent of the order (or thread) in
//! which assets are simulated.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic seed hierarchy.
#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive the sub-seed for one `(asset, trial)` stream.
    pub fn sub_seed(&self, asset: &str, trial: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(asset.as_bytes());
        hasher.update(&trial.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, asset: &str, trial: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(asset, trial))
    }

    /// Master seed for trial `trial` of a multi-trial study.
    pub fn trial_seed(&self, trial: u64) -> u64 {
        self.sub_seed("", trial)
    }
}

/// Where a run's generators come from.
#[derive(Debug, Clone)]
pub enum RngSource {
    /// Reproducible per-asset streams.
    Seeded(RngHierarchy),
    /// OS entropy; a fresh, non-reproducible stream per asset.
    Entropy,
}

impl RngSource {
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::Seeded(RngHierarchy::new(seed)),
            None => Self::Entropy,
        }
    }

    pub fn is_reproducible(&self) -> bool {
        matches!(self, Self::Seeded(_))
    }

    pub fn rng_for(&self, asset: &str) -> StdRng {
        match self {
            Self::Seeded(hierarchy) => hierarchy.rng_for(asset, 0),
            Self::Entropy => StdRng::from_entropy(),
        }
    }
}
