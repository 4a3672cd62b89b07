//! Dataset module for microstructure research
//! Provides snapshot table loading, timestamp normalization, and artifact writing

pub mod loader;
pub mod timestamp;
pub mod writer;

pub use loader::{load_book, normalize_book, read_table};
pub use timestamp::{normalize_column, TimestampUnit, TIMESTAMP_NS};
pub use writer::write_features;
