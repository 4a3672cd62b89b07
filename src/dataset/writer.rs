//! Feature artifact persistence.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::dataset::loader::has_parquet_extension;
use crate::error::Result;

/// Write a feature table to disk, Parquet for a `.parquet` extension and
/// CSV otherwise. Parent directories are created if needed.
pub fn write_features(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    if has_parquet_extension(path) {
        ParquetWriter::new(&mut file).finish(df)?;
    } else {
        CsvWriter::new(&mut file).finish(df)?;
    }

    info!("Saved {} feature rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::loader::read_table;

    fn sample_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("timestamp_ns".into(), vec![1i64, 2]),
            Column::new("symbol".into(), vec!["X", "X"]),
            Column::new("mid".into(), vec![100.0f64, 100.5]),
        ])
        .unwrap()
    }

    #[test]
    fn test_parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/features.parquet");

        let mut df = sample_frame();
        write_features(&mut df, &path).unwrap();

        let loaded = read_table(&path).unwrap();
        assert_eq!(loaded.height(), 2);
        assert_eq!(
            loaded.get_column_names_str(),
            vec!["timestamp_ns", "symbol", "mid"]
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.csv");

        let mut df = sample_frame();
        write_features(&mut df, &path).unwrap();

        let loaded = read_table(&path).unwrap();
        assert_eq!(loaded.height(), 2);
        assert_eq!(
            loaded.column("mid").unwrap().f64().unwrap().get(1),
            Some(100.5)
        );
    }
}
