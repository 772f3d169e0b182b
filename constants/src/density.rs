/// Neighbour count for the k-th neighbour density proxy (query point included)
pub const KNN_K: usize = 32;

/// Lower percentile used to clip the log-density distribution
pub const PERCENTILE_LOW: f64 = 0.5;

/// Upper percentile used to clip the log-density distribution
pub const PERCENTILE_HIGH: f64 = 99.5;

/// Perceptual compression applied after normalisation
pub const PERCEPTUAL_EXPONENT: f64 = 0.8;

/// Added to r_k^3 so coincident points stay finite
pub const VOLUME_EPSILON: f64 = 1e-30;

/// Added to the raw density before taking log10
pub const LOG_EPSILON: f64 = 1e-12;

/// Relative width below which the percentile clip window counts as collapsed.
/// Wide enough to absorb single precision noise in equidistant point sets.
pub const RANGE_EPSILON: f64 = 1e-6;
