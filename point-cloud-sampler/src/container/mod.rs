/// Read-only containers exposing nested, named arrays of coordinates.
#[cfg(feature = "hdf5")]
mod h5;
mod las;
mod memory;

#[cfg(feature = "hdf5")]
pub use self::h5::Hdf5Container;
pub use self::las::{LAS_POINTS_PATH, LasContainer};
pub use self::memory::{MemoryContainer, MemoryOpener};

use crate::error::{Result, SamplerError};
use std::ops::Range;
use std::path::Path;

/// Structural node at a container path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Group with its child names, in the container's traversal order.
    Group(Vec<String>),
    /// Array with its full shape.
    Array(Vec<usize>),
}

impl Node {
    /// Row count of a 2-D array whose second dimension is 3, `None` for
    /// groups and any other shape.
    pub fn coordinate_rows(&self) -> Option<usize> {
        match self {
            Node::Array(shape) if shape.len() == 2 && shape[1] == 3 => Some(shape[0]),
            _ => None,
        }
    }
}

/// A container of coordinate arrays addressed by slash-separated paths.
/// Metadata queries never move array data; `read_rows` is the only data transfer.
pub trait CoordinateContainer {
    /// Human readable identity used in logs and errors.
    fn name(&self) -> &str;

    /// Node at `path`, or `None` when nothing resolves there.
    fn node(&self, path: &str) -> Result<Option<Node>>;

    /// Contiguous rows `rows` of the (N, 3) array at `path`.
    fn read_rows(&mut self, path: &str, rows: Range<usize>) -> Result<Vec<[f64; 3]>>;
}

/// Opens containers for variant paths. The pipeline only touches inputs
/// through this seam.
pub trait ContainerOpener: Sync {
    fn exists(&self, path: &Path) -> bool;

    fn open(&self, path: &Path) -> Result<Box<dyn CoordinateContainer>>;
}

/// Opens files on disk, choosing the backend from the extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileOpener;

impl ContainerOpener for FileOpener {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open(&self, path: &Path) -> Result<Box<dyn CoordinateContainer>> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "las" | "laz" => Ok(Box::new(LasContainer::open(path)?)),
            #[cfg(feature = "hdf5")]
            "h5" | "hdf5" | "hdf" => Ok(Box::new(Hdf5Container::open(path)?)),
            _ => Err(SamplerError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Canonical absolute form of a container path: leading slash, no empty
/// segments. `"PartType1/Coordinates"` and `"/PartType1//Coordinates/"` both
/// become `"/PartType1/Coordinates"`.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Joins a child name onto a normalised group path.
pub fn join_path(group: &str, child: &str) -> String {
    if group == "/" {
        normalize_path(child)
    } else {
        normalize_path(&format!("{group}/{child}"))
    }
}
