/// Fixed sample size used in fixed-count mode
pub const SAMPLE_FIXED: usize = 120_000;

/// Fraction of the population kept in ratio mode
pub const SAMPLE_RATIO: f64 = 0.01;

/// Lower bound on the ratio-mode sample size
pub const SAMPLE_MIN: usize = 5_000;

/// Base seed; each variant offsets it to stay uncorrelated
pub const RNG_SEED: u64 = 12345;
