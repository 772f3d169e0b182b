/// HDF5 snapshot files (enabled with the `hdf5` feature).
use super::{CoordinateContainer, Node, normalize_path};
use crate::error::{Result, SamplerError};
use hdf5::File;
use ndarray::{Array2, s};
use std::ops::Range;
use std::path::Path;

/// HDF5 file opened read-only. Groups map to `Node::Group`, datasets to
/// `Node::Array` with their full shape.
pub struct Hdf5Container {
    name: String,
    file: File,
}

impl Hdf5Container {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            name: path.display().to_string(),
            file: File::open(path)?,
        })
    }
}

impl CoordinateContainer for Hdf5Container {
    fn name(&self) -> &str {
        &self.name
    }

    fn node(&self, path: &str) -> Result<Option<Node>> {
        let path = normalize_path(path);
        if path == "/" {
            return Ok(Some(Node::Group(self.file.member_names()?)));
        }
        // Lookups on absent links fail; that is a miss, not an error.
        if let Ok(dataset) = self.file.dataset(&path) {
            return Ok(Some(Node::Array(dataset.shape())));
        }
        if let Ok(group) = self.file.group(&path) {
            return Ok(Some(Node::Group(group.member_names()?)));
        }
        Ok(None)
    }

    fn read_rows(&mut self, path: &str, rows: Range<usize>) -> Result<Vec<[f64; 3]>> {
        let path = normalize_path(path);
        let dataset = self.file.dataset(&path)?;
        let shape = dataset.shape();
        if shape.len() != 2 || shape[1] != 3 {
            return Err(SamplerError::not_found(format!("{}:{}", self.name, path)));
        }
        if rows.end > shape[0] {
            return Err(SamplerError::IndexOutOfRange {
                index: rows.end.saturating_sub(1),
                len: shape[0],
            });
        }

        let block: Array2<f64> = dataset.read_slice_2d(s![rows.start..rows.end, ..])?;
        Ok(block.outer_iter().map(|r| [r[0], r[1], r[2]]).collect())
    }
}
