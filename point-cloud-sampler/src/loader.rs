/// Partial reads of a located coordinate array by row index.
use crate::container::CoordinateContainer;
use crate::error::{Result, SamplerError};
use crate::locator::DatasetHandle;
use crate::particles::ParticlePositions;
use crate::sampling::RowIndexSet;
use std::ops::Range;
use tracing::debug;

/// A single contiguous read and the rows it must yield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPlan {
    /// Rows covered by the read, `[first member, last member + 1)`.
    pub range: Range<usize>,
    /// Requested rows inside `range`, ascending.
    pub members: Vec<usize>,
}

impl ReadPlan {
    /// True when every row in the range was requested.
    pub fn is_dense(&self) -> bool {
        self.members.len() == self.range.len()
    }
}

/// Groups the indices into reads. With `gap_tolerance` 0 every plan is a
/// maximal run of consecutive integers; larger tolerances merge runs
/// separated by at most that many unrequested rows.
pub fn plan_reads(indices: &RowIndexSet, gap_tolerance: usize) -> Vec<ReadPlan> {
    let mut plans: Vec<ReadPlan> = Vec::new();

    // Ascending and distinct, so `index >= plan.range.end` always holds.
    for &index in indices.as_slice() {
        match plans.last_mut() {
            Some(plan) if index - plan.range.end <= gap_tolerance => {
                plan.range.end = index + 1;
                plan.members.push(index);
            }
            _ => plans.push(ReadPlan {
                range: index..index + 1,
                members: vec![index],
            }),
        }
    }

    plans
}

/// Loads rows of a located array, one range read per plan.
#[derive(Debug, Clone, Copy)]
pub struct RowRangeLoader {
    precision: u32,
    gap_tolerance: usize,
}

impl RowRangeLoader {
    pub fn new(precision: u32, gap_tolerance: usize) -> Self {
        Self {
            precision,
            gap_tolerance,
        }
    }

    /// Requested rows in ascending index order, rounded to the configured
    /// number of decimals and stored as `f32`.
    pub fn load(
        &self,
        container: &mut dyn CoordinateContainer,
        dataset: &DatasetHandle,
        indices: &RowIndexSet,
    ) -> Result<ParticlePositions> {
        if indices.is_empty() {
            return Ok(ParticlePositions::empty());
        }
        if let Some(&last) = indices.as_slice().last() {
            if last >= dataset.len {
                return Err(SamplerError::IndexOutOfRange {
                    index: last,
                    len: dataset.len,
                });
            }
        }

        let plans = plan_reads(indices, self.gap_tolerance);
        debug!(
            path = %dataset.path,
            rows = indices.len(),
            reads = plans.len(),
            "loading sampled rows"
        );

        let scale = 10f64.powi(self.precision as i32);
        let mut rows = Vec::with_capacity(indices.len());

        for plan in &plans {
            let block = container.read_rows(&dataset.path, plan.range.clone())?;
            if block.len() != plan.range.len() {
                return Err(SamplerError::ShapeMismatch {
                    path: dataset.path.clone(),
                    expected: plan.range.len(),
                    actual: block.len(),
                });
            }

            if plan.is_dense() {
                rows.extend(block.iter().map(|row| round_row(row, scale)));
            } else {
                rows.extend(
                    plan.members
                        .iter()
                        .map(|&index| round_row(&block[index - plan.range.start], scale)),
                );
            }
        }

        Ok(ParticlePositions::new(rows))
    }
}

/// Rounds half to even at the given decimal scale, then narrows to `f32`.
fn round_row(row: &[f64; 3], scale: f64) -> [f32; 3] {
    row.map(|v| ((v * scale).round_ties_even() / scale) as f32)
}
