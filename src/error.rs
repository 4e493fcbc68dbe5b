//! Error types for spinlab.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Lattice size does not match model dimensions: expected {expected}x{expected}, got {rows}x{cols}")]
    DimensionMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
