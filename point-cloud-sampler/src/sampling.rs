/// Reproducible subsampling of row indices.
use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Distinct row indices, kept sorted so reads can be planned in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIndexSet {
    indices: Vec<usize>,
}

impl RowIndexSet {
    /// Sorts and deduplicates arbitrary indices.
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// Every index in `[0, n)`.
    pub fn all(n: usize) -> Self {
        Self {
            indices: (0..n).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }
}

/// How the target sample size is derived from the population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    Fixed,
    Ratio,
}

/// Sampling parameters for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub mode: SamplingMode,
    /// Upper bound on any sample, and the target in fixed mode.
    pub fixed_count: usize,
    /// Fraction of the population kept in ratio mode.
    pub ratio: f64,
    /// Lower floor for ratio mode.
    pub minimum: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        use constants::sampling::{SAMPLE_FIXED, SAMPLE_MIN, SAMPLE_RATIO};
        Self {
            mode: SamplingMode::Fixed,
            fixed_count: SAMPLE_FIXED,
            ratio: SAMPLE_RATIO,
            minimum: SAMPLE_MIN,
        }
    }
}

impl SamplingConfig {
    /// Target size for a population of `n`. Fixed mode keeps
    /// `min(n, fixed_count)`; ratio mode keeps `max(minimum, floor(n * ratio))`.
    /// Both are finally bounded by `min(n, fixed_count)`.
    pub fn target_size(&self, n: usize) -> usize {
        let cap = n.min(self.fixed_count);
        match self.mode {
            SamplingMode::Fixed => cap,
            SamplingMode::Ratio => {
                let proportional = (n as f64 * self.ratio).floor() as usize;
                proportional.max(self.minimum).min(cap)
            }
        }
    }
}

/// Picks `target` distinct indices from `[0, n)`, uniformly and reproducibly
/// for a given seed. When the whole population fits, every index is kept.
pub fn downsample(n: usize, target: usize, seed: u64) -> RowIndexSet {
    if n <= target {
        return RowIndexSet::all(n);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    RowIndexSet::from_indices(index::sample(&mut rng, n, target).into_vec())
}
