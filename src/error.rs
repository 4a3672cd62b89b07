//! Error types for the research toolkit.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// A required input column is absent; raised before any computation starts
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// No value in the timestamp column parsed by any strategy
    #[error("unrecognized timestamp format; provide ISO 8601, datetime values, or epoch integers")]
    UnrecognizedTimestampFormat,

    /// Splitter precondition violation
    #[error("invalid split: n_splits={n_splits} must be between 1 and n_samples={n_samples}")]
    InvalidSplit { n_splits: usize, n_samples: usize },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;
