//! Snapshot table loading and normalization.

use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::dataset::timestamp::{normalize_column, TimestampUnit, TIMESTAMP_NS};
use crate::error::{Error, Result};

/// Raw timestamp column names accepted in input tables, checked in order
const TIMESTAMP_CANDIDATES: [&str; 3] = ["timestamp", "ts", TIMESTAMP_NS];

/// Load a snapshot table from disk and normalize it for feature extraction.
///
/// The file format is chosen by the input extension (`.parquet` or
/// delimited text). The timestamp column is converted to i64 nanoseconds
/// and the table is sorted ascending by `(symbol, timestamp_ns)`.
pub fn load_book(path: &Path, unit: Option<TimestampUnit>) -> Result<DataFrame> {
    let df = read_table(path)?;
    let book = normalize_book(df, unit)?;
    info!("Loaded {} snapshots from {}", book.height(), path.display());
    Ok(book)
}

/// Read a CSV or Parquet table, chosen by the file extension.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let df = if has_parquet_extension(path) {
        LazyFrame::scan_parquet(path, Default::default())?.collect()?
    } else {
        CsvReadOptions::default()
            .with_infer_schema_length(Some(1000))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?
    };
    Ok(df)
}

/// Replace the raw timestamp column with canonical nanoseconds and sort
/// the table by `(symbol, timestamp_ns)`.
pub fn normalize_book(df: DataFrame, unit: Option<TimestampUnit>) -> Result<DataFrame> {
    let raw_name = TIMESTAMP_CANDIDATES
        .iter()
        .copied()
        .find(|name| df.column(name).is_ok())
        .ok_or_else(|| Error::MissingColumn("timestamp".to_string()))?;
    if df.column("symbol").is_err() {
        return Err(Error::MissingColumn("symbol".to_string()));
    }

    let ns = normalize_column(df.column(raw_name)?, unit)?;
    let mut df = df.drop(raw_name)?;
    df.with_column(ns)?;
    let df = df.sort(["symbol", TIMESTAMP_NS], SortMultipleOptions::default())?;
    Ok(df)
}

/// Whether the path selects the Parquet format
pub fn has_parquet_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("parquet"))
        .unwrap_or(false)
}
