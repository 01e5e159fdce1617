//! Error types for mangrove analysis

use thiserror::Error;

/// Main error type for mangrove core and algorithm operations.
///
/// Errors are `Clone` so that one failed computation can be handed to every
/// caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Bad input shape or range. Always recoverable by the caller.
    #[error("validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Insufficient or degenerate samples for a linear solve.
    #[error("singular matrix: {0}")]
    SingularMatrix(String),

    /// Self-intersecting, empty or otherwise malformed geometry.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("computation cancelled")]
    Cancelled,

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for mangrove operations
pub type Result<T> = std::result::Result<T, Error>;
