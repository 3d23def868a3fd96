//! Error types for the post-processing pipeline.
//!
//! Every failure is fatal for the run. The variants carry the offending path,
//! line or count so the message points straight at the bad input.

use std::path::Path;
use thiserror::Error;

/// Result alias used throughout the crate
pub type PostResult<T> = Result<T, PostError>;

#[derive(Error, Debug)]
pub enum PostError {
    /// Reading or writing a file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A token could not be read as a finite number
    #[error("parse error in {path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    /// A row does not have the same number of columns as the first data row
    #[error("inconsistent columns in {path}:{line}: expected {expected}, found {found}")]
    ColumnCount {
        path: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// The table is narrower than the caller needs
    #[error("{path} has {found} column(s), at least {required} required")]
    TooFewColumns {
        path: String,
        required: usize,
        found: usize,
    },

    #[error("{path} contains no data rows")]
    EmptyTable { path: String },

    /// Fewer than three distinct node coordinates along one axis
    #[error("mesh has {found} distinct {axis} node(s), at least 3 required")]
    InsufficientNodes { axis: &'static str, found: usize },

    #[error("non-uniform {axis} spacing at cell interval {index}: expected {expected:e}, found {found:e}")]
    NonUniformSpacing {
        axis: &'static str,
        index: usize,
        expected: f64,
        found: f64,
    },

    /// The velocity file does not hold exactly one row per cell
    #[error("{path} has {found} velocity rows, the cell grid needs {expected}")]
    CellCountMismatch {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("failed to write image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

impl PostError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        PostError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
