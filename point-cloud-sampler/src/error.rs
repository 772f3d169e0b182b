/// Error types for the sampling pipeline.
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Every failure the pipeline can report. Anything below the orchestrator
/// returns one of these; the orchestrator turns them into skipped subjects.
#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No (N, 3) array in the container, neither at a candidate path nor
    /// anywhere in its structure.
    #[error("no Nx3 coordinate array found in {container}")]
    NotFound { container: String },

    /// Expected input files are absent.
    #[error("missing input files: {}", display_paths(.paths))]
    MissingInput { paths: Vec<PathBuf> },

    /// Density was requested for fewer points than the estimator accepts.
    #[error("insufficient points: {available} available, at least {required} required")]
    InsufficientPoints { available: usize, required: usize },

    #[error("row index {index} out of range for dataset of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    /// A backend returned a different number of rows than the range asked for.
    #[error("read of {path} returned {actual} rows, expected {expected}")]
    ShapeMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported container format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("LAS error: {0}")]
    Las(#[from] las::Error),

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not persist artifact: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("subject exceeded its time budget ({elapsed:?} > {budget:?})")]
    Timeout { elapsed: Duration, budget: Duration },
}

pub type Result<T> = std::result::Result<T, SamplerError>;

impl SamplerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn not_found(container: impl Into<String>) -> Self {
        Self::NotFound {
            container: container.into(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
