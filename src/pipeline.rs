//! Feature pipeline driver: load, normalize, extract, write.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::dataset::{load_book, write_features, TimestampUnit};
use crate::error::Result;
use crate::features::compute_features;

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    /// Emitted feature rows
    pub rows: usize,
    /// Emitted column names, in artifact order
    pub columns: Vec<String>,
    /// Path of the written artifact
    pub path: PathBuf,
}

/// Run the full feature pipeline for one input table.
///
/// Structural errors (missing column, unrecognized timestamps) abort
/// before anything is written; on success exactly one artifact exists at
/// `output`.
pub fn run(input: &Path, output: &Path, ts_unit: Option<TimestampUnit>) -> Result<PipelineSummary> {
    let book = load_book(input, ts_unit)?;
    let mut features = compute_features(&book)?;
    write_features(&mut features, output)?;

    let summary = PipelineSummary {
        rows: features.height(),
        columns: features
            .get_column_names_str()
            .into_iter()
            .map(str::to_string)
            .collect(),
        path: output.to_path_buf(),
    };
    info!(
        "Pipeline finished: {} rows -> {}",
        summary.rows,
        summary.path.display()
    );
    Ok(summary)
}
