//! Error types for raster operators.
//!
//! Every variant is a configuration error: it is raised while building an
//! operator or while checking tile arguments, before any sample is written.

use rastkit_core::SampleKind;
use thiserror::Error;

/// Error type for raster operators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpsError {
    /// Error from a core type (layout, range, fallback broadcast).
    #[error(transparent)]
    Core(#[from] rastkit_core::Error),

    /// A source does not have the expected band count.
    #[error("source {source_index} has {got} bands, expected {expected}")]
    BandMismatch {
        /// Index of the offending source
        source_index: usize,
        /// Expected band count
        expected: usize,
        /// Actual band count
        got: usize,
    },

    /// A source does not have the expected sample kind.
    #[error("source {source_index} has sample kind {got}, expected {expected}")]
    KindMismatch {
        /// Index of the offending source
        source_index: usize,
        /// Expected sample kind
        expected: SampleKind,
        /// Actual sample kind
        got: SampleKind,
    },

    /// A band-combine matrix row has the wrong length.
    #[error("matrix row {row} has {got} columns, expected {expected} (source bands + 1)")]
    MatrixShape {
        /// Offending row
        row: usize,
        /// Expected column count
        expected: usize,
        /// Actual column count
        got: usize,
    },

    /// A band-combine matrix has no rows.
    #[error("matrix must have at least one row")]
    EmptyMatrix,

    /// The fallback color-map index is not a valid entry.
    #[error("fallback index {index} out of range for color map with {len} entries")]
    FallbackIndex {
        /// Configured fallback index
        index: usize,
        /// Number of color map entries
        len: usize,
    },

    /// The operation cannot run on this configuration.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Tile arguments do not match the operator configuration.
    #[error("tile mismatch: {0}")]
    TileMismatch(String),

    /// Rows of a sequential pass were fed out of order.
    #[error("row {got} fed to sequential pass, expected row {expected}")]
    OutOfOrder {
        /// Next row the pass expects
        expected: i32,
        /// Row that was supplied
        got: i32,
    },
}

/// Result type for raster operators.
pub type OpsResult<T> = Result<T, OpsError>;
