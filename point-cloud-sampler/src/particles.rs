/// Sampled particle positions and their co-indexed density field.
use serde::{Deserialize, Serialize};

/// Dense (M, 3) single precision positions, rows in ascending source index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticlePositions {
    rows: Vec<[f32; 3]>,
}

impl ParticlePositions {
    pub fn new(rows: Vec<[f32; 3]>) -> Self {
        Self { rows }
    }

    /// Zero-row set, the result of loading an empty index set.
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[[f32; 3]] {
        &self.rows
    }

    /// Shape as (rows, columns), matching the (M, 3) array layout.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), 3)
    }
}

/// One density scalar in [0, 1] per position row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DensityField {
    values: Vec<f32>,
}

impl DensityField {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Positions paired with their density. The pairing is fixed at construction
/// and the two halves are never exposed mutably.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampledCloud {
    positions: ParticlePositions,
    density: DensityField,
}

impl SampledCloud {
    /// Pairs positions with a density field of the same length.
    /// Returns `None` when the lengths differ.
    pub fn pair(positions: ParticlePositions, density: DensityField) -> Option<Self> {
        (positions.len() == density.len()).then_some(Self { positions, density })
    }

    pub fn positions(&self) -> &ParticlePositions {
        &self.positions
    }

    pub fn density(&self) -> &DensityField {
        &self.density
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
