/// k-th nearest neighbour density estimate, remapped for display.
///
/// The raw proxy `1 / r_k^3` is a standard local density estimate. Everything
/// after it (log compression, percentile clipping and the power curve) is a
/// perceptual remap for colouring points, not a statistical correction.
use crate::error::{Result, SamplerError};
use crate::particles::{DensityField, ParticlePositions};
use kiddo::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Normalised value used when the clip range collapses.
const COLLAPSED_RANGE_VALUE: f64 = 0.5;

/// Bucket size of the neighbour index.
const LEAF_SIZE: usize = 32;

type NeighbourIndex = ImmutableKdTree<f64, u64, 3, LEAF_SIZE>;

/// Tuning for the estimator. The percentile bounds and exponent are
/// presentation constants and should be revisited per dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Neighbour count, the query point itself included.
    pub k: usize,
    pub percentile_low: f64,
    pub percentile_high: f64,
    /// Power applied to the normalised value; below 1 lifts sparse regions.
    pub exponent: f64,
    pub volume_epsilon: f64,
    pub log_epsilon: f64,
    /// Clip windows narrower than this, relative to the magnitude of their
    /// bounds, count as collapsed.
    pub range_epsilon: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        use constants::density::{
            KNN_K, LOG_EPSILON, PERCENTILE_HIGH, PERCENTILE_LOW, PERCEPTUAL_EXPONENT,
            RANGE_EPSILON, VOLUME_EPSILON,
        };
        Self {
            k: KNN_K,
            percentile_low: PERCENTILE_LOW,
            percentile_high: PERCENTILE_HIGH,
            exponent: PERCEPTUAL_EXPONENT,
            volume_epsilon: VOLUME_EPSILON,
            log_epsilon: LOG_EPSILON,
            range_epsilon: RANGE_EPSILON,
        }
    }
}

pub struct DensityEstimator {
    config: DensityConfig,
}

impl DensityEstimator {
    pub fn new(config: DensityConfig) -> Self {
        Self { config }
    }

    /// One value in [0, 1] per position. Sets smaller than `k` use every
    /// available neighbour (at most M - 1 besides the point itself); an empty
    /// set is `InsufficientPoints`.
    pub fn estimate(&self, positions: &ParticlePositions) -> Result<DensityField> {
        let m = positions.len();
        if m == 0 {
            return Err(SamplerError::InsufficientPoints {
                available: 0,
                required: 1,
            });
        }

        let k = self.config.k.clamp(1, m);
        if k < self.config.k {
            debug!(
                points = m,
                requested = self.config.k,
                used = k,
                "fewer points than neighbours requested"
            );
        }

        let log_density = self.log_density(positions, k);
        Ok(DensityField::new(self.normalize(&log_density)))
    }

    /// `log10(1 / (r_k^3 + eps) + eps2)` per point.
    fn log_density(&self, positions: &ParticlePositions, k: usize) -> Vec<f64> {
        let points: Vec<[f64; 3]> = positions
            .rows()
            .iter()
            .map(|r| r.map(f64::from))
            .collect();
        let index = NeighbourIndex::new_from_slice(&points);

        points
            .par_iter()
            .map(|point| {
                let rk = kth_neighbour_distance2(&index, point, k).sqrt();
                let raw = 1.0 / (rk * rk * rk + self.config.volume_epsilon);
                (raw + self.config.log_epsilon).log10()
            })
            .collect()
    }

    /// Percentile clip to [0, 1] followed by the perceptual power curve.
    fn normalize(&self, log_density: &[f64]) -> Vec<f32> {
        let mut sorted = log_density.to_vec();
        sorted.sort_by(f64::total_cmp);
        let lo = percentile(&sorted, self.config.percentile_low);
        let hi = percentile(&sorted, self.config.percentile_high);
        let span = hi - lo;
        let scale = lo.abs().max(hi.abs()).max(1.0);
        let collapsed = !(span > self.config.range_epsilon * scale);

        log_density
            .iter()
            .map(|&d| {
                let unit = if collapsed {
                    COLLAPSED_RANGE_VALUE
                } else {
                    ((d - lo) / span).clamp(0.0, 1.0)
                };
                unit.powf(self.config.exponent) as f32
            })
            .collect()
    }
}

/// Squared distance from `query` to its k-th nearest indexed point, the
/// query itself counted when it is indexed. 0 when nothing is found.
fn kth_neighbour_distance2(index: &NeighbourIndex, query: &[f64; 3], k: usize) -> f64 {
    std::num::NonZeroUsize::new(k)
        .and_then(|k| index.nearest_n::<SquaredEuclidean>(query, k).last().copied())
        .map_or(0.0, |neighbour| neighbour.distance)
}

/// Percentile `q` (0..=100) of ascending data, interpolating linearly
/// between the two closest ranks.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let below = rank.floor() as usize;
            let above = (below + 1).min(n - 1);
            let weight = rank - below as f64;
            sorted[below] + (sorted[above] - sorted[below]) * weight
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn uniform_cube(n: usize, side: f64, seed: u64) -> Vec<[f32; 3]> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                [
                    rng.gen_range(0.0..side) as f32,
                    rng.gen_range(0.0..side) as f32,
                    rng.gen_range(0.0..side) as f32,
                ]
            })
            .collect()
    }

    fn brute_force_kth(points: &[[f64; 3]], query: &[f64; 3], k: usize) -> f64 {
        let mut d: Vec<f64> = points
            .iter()
            .map(|p| (0..3).map(|a| (p[a] - query[a]).powi(2)).sum())
            .collect();
        d.sort_by(f64::total_cmp);
        d[k - 1]
    }

    fn median(values: &[f32]) -> f32 {
        let mut v = values.to_vec();
        v.sort_by(f32::total_cmp);
        v[v.len() / 2]
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let data = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.0), 0.0);
        assert_eq!(percentile(&data, 100.0), 4.0);
        assert_eq!(percentile(&data, 50.0), 2.0);
        assert!((percentile(&data, 12.5) - 0.5).abs() < 1e-12);
        assert_eq!(percentile(&[7.0], 99.5), 7.0);
    }

    #[test]
    fn kth_neighbour_matches_brute_force() {
        let points: Vec<[f64; 3]> = uniform_cube(2_000, 20.0, 7)
            .into_iter()
            .map(|r| r.map(f64::from))
            .collect();
        let index = NeighbourIndex::new_from_slice(&points);

        for (i, query) in points.iter().enumerate().step_by(37) {
            assert_eq!(
                kth_neighbour_distance2(&index, query, 16),
                brute_force_kth(&points, query, 16),
                "query {i}"
            );
            assert_eq!(kth_neighbour_distance2(&index, query, 1), 0.0);
        }
        let outside = [45.0, -3.0, 0.5];
        assert_eq!(
            kth_neighbour_distance2(&index, &outside, 5),
            brute_force_kth(&points, &outside, 5)
        );
    }

    #[test]
    fn kth_neighbour_handles_coincident_points() {
        let mut points = vec![[1.0, 1.0, 1.0]; 5_000];
        points.extend((0..400).map(|i| [0.0, i as f64, 0.0]));
        let index = NeighbourIndex::new_from_slice(&points);

        assert_eq!(kth_neighbour_distance2(&index, &[1.0, 1.0, 1.0], 32), 0.0);
        for k in [1, 2, 3, 8, 50] {
            assert_eq!(
                kth_neighbour_distance2(&index, &[0.0, 3.0, 0.0], k),
                brute_force_kth(&points, &[0.0, 3.0, 0.0], k),
                "k = {k}"
            );
        }
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let positions = ParticlePositions::new(uniform_cube(3_000, 50.0, 1));
        let density = DensityEstimator::new(DensityConfig::default())
            .estimate(&positions)
            .unwrap();

        assert_eq!(density.len(), positions.len());
        assert!(density.values().iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(density.values().iter().any(|&v| v == 0.0));
        assert!(density.values().iter().any(|&v| v == 1.0));
    }

    #[test]
    fn coincident_points_give_a_constant() {
        let positions = ParticlePositions::new(vec![[2.5, -1.0, 3.0]; 100]);
        let density = DensityEstimator::new(DensityConfig::default())
            .estimate(&positions)
            .unwrap();

        let expected = 0.5f64.powf(0.8) as f32;
        assert!(density.values().iter().all(|v| v.is_finite()));
        assert!(density.values().iter().all(|&v| v == expected));
    }

    #[test]
    fn equidistant_points_give_a_constant() {
        // Regular 12-gon: every point sees the same neighbour distances up to
        // single precision noise.
        let ring: Vec<[f32; 3]> = (0..12)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 12.0;
                [(10.0 * angle.cos()) as f32, (10.0 * angle.sin()) as f32, 0.0]
            })
            .collect();
        let positions = ParticlePositions::new(ring);
        let expected = 0.5f64.powf(0.8) as f32;

        for k in [3, 32] {
            let config = DensityConfig {
                k,
                ..DensityConfig::default()
            };
            let density = DensityEstimator::new(config).estimate(&positions).unwrap();
            assert!(
                density.values().iter().all(|&v| v == expected),
                "k = {k}: {:?}",
                density.values()
            );
        }
    }

    #[test]
    fn small_sets_use_every_available_neighbour() {
        let positions = ParticlePositions::new(uniform_cube(10, 1.0, 9));
        let density = DensityEstimator::new(DensityConfig::default())
            .estimate(&positions)
            .unwrap();
        assert_eq!(density.len(), 10);
        assert!(density.values().iter().all(|v| (0.0..=1.0).contains(v)));

        let single = ParticlePositions::new(vec![[0.0, 0.0, 0.0]]);
        let density = DensityEstimator::new(DensityConfig::default())
            .estimate(&single)
            .unwrap();
        assert_eq!(density.values(), &[0.5f64.powf(0.8) as f32]);
    }

    #[test]
    fn empty_input_is_insufficient() {
        let err = DensityEstimator::new(DensityConfig::default())
            .estimate(&ParticlePositions::empty())
            .unwrap_err();
        assert!(matches!(
            err,
            SamplerError::InsufficientPoints {
                available: 0,
                required: 1
            }
        ));
    }

    #[test]
    fn denser_population_ranks_higher() {
        // Same volume, twice the points in the second population.
        let sparse = uniform_cube(1_000, 10.0, 21);
        let dense: Vec<[f32; 3]> = uniform_cube(2_000, 10.0, 22)
            .into_iter()
            .map(|[x, y, z]| [x + 100.0, y, z])
            .collect();

        let mut rows = sparse.clone();
        rows.extend(dense.iter().copied());
        let positions = ParticlePositions::new(rows);
        let density = DensityEstimator::new(DensityConfig::default())
            .estimate(&positions)
            .unwrap();

        let (sparse_values, dense_values) = density.values().split_at(sparse.len());
        assert!(median(dense_values) > median(sparse_values));
    }

    #[test]
    fn tighter_spacing_never_lowers_density() {
        // A regular lattice and the same lattice at half spacing.
        let lattice = |spacing: f32, offset: f32| -> Vec<[f32; 3]> {
            let mut rows = Vec::new();
            for x in 0..8 {
                for y in 0..8 {
                    for z in 0..8 {
                        rows.push([
                            offset + x as f32 * spacing,
                            y as f32 * spacing,
                            z as f32 * spacing,
                        ]);
                    }
                }
            }
            rows
        };

        let mut rows = lattice(2.0, 0.0);
        rows.extend(lattice(1.0, 1_000.0));
        let density = DensityEstimator::new(DensityConfig::default())
            .estimate(&ParticlePositions::new(rows))
            .unwrap();

        let (wide, tight) = density.values().split_at(512);
        let wide_max = wide.iter().copied().fold(f32::MIN, f32::max);
        let tight_min = tight.iter().copied().fold(f32::MAX, f32::min);
        assert!(tight_min >= wide_max);
    }
}
