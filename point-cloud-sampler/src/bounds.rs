/// Axis-aligned bounds shared by the variants of one subject
use crate::particles::ParticlePositions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloudBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for PointCloudBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudBounds {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    /// Update bounds with a new point
    pub fn update(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Extend with every row of a position set
    pub fn include(&mut self, positions: &ParticlePositions) {
        for &[x, y, z] in positions.rows() {
            self.update(x as f64, y as f64, z as f64);
        }
    }

    /// Bounds enclosing every given position set
    pub fn enclosing<'a>(sets: impl IntoIterator<Item = &'a ParticlePositions>) -> Self {
        let mut bounds = Self::new();
        for positions in sets {
            bounds.include(positions);
        }
        bounds
    }
}
