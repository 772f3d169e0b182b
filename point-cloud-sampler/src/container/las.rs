/// LAS/LAZ point clouds exposed as a single coordinate array.
use super::{CoordinateContainer, Node, normalize_path};
use crate::error::{Result, SamplerError};
use las::Reader;
use std::fs::File;
use std::io::BufReader;
use std::ops::Range;
use std::path::Path;

/// Path of the point records inside a LAS container.
pub const LAS_POINTS_PATH: &str = "/points";

/// A LAS or LAZ file. The root group holds one array, `points`, of shape
/// (number_of_points, 3) with scaled world coordinates.
pub struct LasContainer {
    name: String,
    point_count: usize,
    reader: Reader,
}

impl LasContainer {
    /// Opens the file and reads its header. Point data is only touched by
    /// `read_rows`, which seeks straight to the first requested record.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = Reader::new(BufReader::new(file))?;
        let point_count = reader.header().number_of_points() as usize;

        Ok(Self {
            name: path.display().to_string(),
            point_count,
            reader,
        })
    }
}

impl CoordinateContainer for LasContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn node(&self, path: &str) -> Result<Option<Node>> {
        let path = normalize_path(path);
        Ok(if path == "/" {
            Some(Node::Group(vec![LAS_POINTS_PATH.trim_start_matches('/').to_string()]))
        } else if path == LAS_POINTS_PATH {
            Some(Node::Array(vec![self.point_count, 3]))
        } else {
            None
        })
    }

    fn read_rows(&mut self, path: &str, rows: Range<usize>) -> Result<Vec<[f64; 3]>> {
        if normalize_path(path) != LAS_POINTS_PATH {
            return Err(SamplerError::not_found(format!("{}:{}", self.name, path)));
        }
        if rows.end > self.point_count {
            return Err(SamplerError::IndexOutOfRange {
                index: rows.end.saturating_sub(1),
                len: self.point_count,
            });
        }

        let expected = rows.len();
        self.reader.seek(rows.start as u64)?;
        let mut out = Vec::with_capacity(expected);
        for point in self.reader.points().take(expected) {
            let point = point?;
            out.push([point.x, point.y, point.z]);
        }
        if out.len() != expected {
            return Err(SamplerError::ShapeMismatch {
                path: format!("{}:{}", self.name, LAS_POINTS_PATH),
                expected,
                actual: out.len(),
            });
        }
        Ok(out)
    }
}
