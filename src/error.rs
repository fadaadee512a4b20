//! Error types for session setup, image loading and table persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading a `.npy` image sequence.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not an .npy file (bad magic)")]
    BadMagic,
    #[error("unsupported .npy format version {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("malformed .npy header: {0}")]
    BadHeader(String),
    #[error("unsupported dtype '{0}'")]
    UnsupportedDtype(String),
    #[error("fortran-ordered arrays are not supported")]
    FortranOrder,
    #[error("expected a [N, H, W, C] or [N, H, W] array, got shape {0:?}")]
    BadShape(Vec<usize>),
    #[error("image data truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("shape needs {expected} values but {actual} were given")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("image sequence is empty")]
    Empty,
}

/// Failures while loading, validating or flushing the annotation table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cell {cell} is annotated more than once")]
    DuplicateCell { cell: i64 },
    #[error("cell {cell} is outside the image sequence (0..{len})")]
    CellOutOfRange { cell: i64, len: usize },
    #[error("cell {cell} has unknown label {label}")]
    UnknownLabel { cell: i64, label: i64 },
}

/// Fatal failures while starting a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid user identifier '{0}'")]
    InvalidUser(String),
    #[error("no image sequence at {0}")]
    MissingImages(PathBuf),
    #[error(transparent)]
    Images(#[from] ImageError),
    #[error(transparent)]
    Table(#[from] TableError),
}
