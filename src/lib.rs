//! Book Lab - microstructure research toolkit
//!
//! This crate turns raw top-of-book snapshot tables into derived
//! microstructure features and evaluates models on them without temporal
//! label leakage:
//!
//! - Timestamp normalization (datetimes, ISO 8601 strings, epoch values)
//! - Order book feature extraction (mid, spread, queue imbalance,
//!   microprice, L1 order-flow imbalance)
//! - Purged, embargoed K-fold cross-validation
//! - A metrics relay endpoint for the surrounding service
//!
//! # Quick Start
//!
//! ```rust
//! use book_lab::cv::PurgedKFold;
//!
//! let ts_ns: Vec<i64> = (0..10).map(|i| i * 1_000_000).collect();
//! let splitter = PurgedKFold::new(5).with_embargo_ns(500_000);
//! for fold in splitter.split(&ts_ns).unwrap() {
//!     assert_eq!(fold.test.len(), 2);
//! }
//! ```

pub mod cv;
pub mod dataset;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod relay;

// Re-export commonly used types
pub use cv::{Fold, PurgedKFold};
pub use dataset::{load_book, normalize_column, write_features, TimestampUnit, TIMESTAMP_NS};
pub use error::{Error, Result};
pub use features::{compute_features, FEATURE_COLUMNS};
pub use pipeline::PipelineSummary;
pub use relay::{RelayConfig, DEFAULT_UPSTREAM_URL};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
