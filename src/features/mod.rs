//! Order book feature extraction
//!
//! Derives per-snapshot microstructure features from a top-of-book table:
//!
//! - `mid`: simple mid price
//! - `spread`: bid-ask spread
//! - `q_imbalance`: queue imbalance in [-1, 1]
//! - `microprice`: mid weighted by opposite-side resting size
//! - `ofi_l1`: order-flow imbalance proxy against the previous snapshot
//!   of the same symbol
//!
//! A row is emitted only when every feature is defined; rows with zero
//! total size and each symbol's first snapshot (no OFI predecessor) are
//! dropped. Input must be sorted ascending by `(symbol, timestamp_ns)`.

use polars::prelude::*;
use tracing::debug;

use crate::dataset::TIMESTAMP_NS;
use crate::error::{Error, Result};

/// Feature artifact column names, in output order
pub const FEATURE_COLUMNS: [&str; 7] = [
    TIMESTAMP_NS,
    "symbol",
    "q_imbalance",
    "microprice",
    "spread",
    "ofi_l1",
    "mid",
];

/// Input columns the extractor requires
const REQUIRED_COLUMNS: [&str; 6] = [
    TIMESTAMP_NS,
    "symbol",
    "bid_price",
    "bid_size",
    "ask_price",
    "ask_size",
];

/// Top-of-book state carried between consecutive snapshots of one symbol
#[derive(Debug, Clone, Copy)]
struct BookLevel {
    bid_price: f64,
    bid_size: f64,
    ask_price: f64,
    ask_size: f64,
}

/// Per-row feature values with explicit definedness.
///
/// Each undefined feature stays `None` so drop reasons remain inspectable;
/// a row reaches the output only when [`RowFeatures::defined`] holds.
#[derive(Debug, Clone, Copy)]
struct RowFeatures {
    mid: f64,
    spread: f64,
    q_imbalance: Option<f64>,
    microprice: Option<f64>,
    ofi_l1: Option<f64>,
}

impl RowFeatures {
    fn defined(&self) -> bool {
        self.q_imbalance.is_some() && self.microprice.is_some() && self.ofi_l1.is_some()
    }
}

/// Simple mid price
pub fn mid(bid_price: f64, ask_price: f64) -> f64 {
    (bid_price + ask_price) / 2.0
}

/// Bid-ask spread
pub fn spread(bid_price: f64, ask_price: f64) -> f64 {
    ask_price - bid_price
}

/// Queue imbalance `(bid_size - ask_size) / (bid_size + ask_size)`.
///
/// Undefined when both sides are empty.
pub fn q_imbalance(bid_size: f64, ask_size: f64) -> Option<f64> {
    let total = bid_size + ask_size;
    if total == 0.0 {
        None
    } else {
        Some((bid_size - ask_size) / total)
    }
}

/// Microprice `(bid_price * ask_size + ask_price * bid_size) / total_size`.
///
/// Undefined when both sides are empty.
pub fn microprice(bid_price: f64, ask_price: f64, bid_size: f64, ask_size: f64) -> Option<f64> {
    let total = bid_size + ask_size;
    if total == 0.0 {
        None
    } else {
        Some((bid_price * ask_size + ask_price * bid_size) / total)
    }
}

/// L1 order-flow imbalance against the previous snapshot of the same symbol.
///
/// Bid term: size on a price improvement, size delta at an unchanged
/// price, zero on a retreat. Ask term mirrors with the comparison flipped.
fn ofi_l1(curr: &BookLevel, prev: &BookLevel) -> f64 {
    let term_bid = if curr.bid_price > prev.bid_price {
        curr.bid_size
    } else if curr.bid_price == prev.bid_price {
        curr.bid_size - prev.bid_size
    } else {
        0.0
    };

    let term_ask = if curr.ask_price < prev.ask_price {
        curr.ask_size
    } else if curr.ask_price == prev.ask_price {
        curr.ask_size - prev.ask_size
    } else {
        0.0
    };

    term_bid - term_ask
}

/// Compute the feature table for a normalized, sorted snapshot table.
///
/// Fails with [`Error::MissingColumn`] before any computation when a
/// required column is absent. Rows with any undefined feature are dropped;
/// the relative order of emitted rows is preserved.
pub fn compute_features(book: &DataFrame) -> Result<DataFrame> {
    for name in REQUIRED_COLUMNS {
        if book.column(name).is_err() {
            return Err(Error::MissingColumn(name.to_string()));
        }
    }

    let ts = book.column(TIMESTAMP_NS)?.cast(&DataType::Int64)?;
    let ts = ts.i64()?;
    let symbols = book.column("symbol")?;
    let symbols = symbols.str()?;
    let bid_price = book.column("bid_price")?.cast(&DataType::Float64)?;
    let bid_price = bid_price.f64()?;
    let bid_size = book.column("bid_size")?.cast(&DataType::Float64)?;
    let bid_size = bid_size.f64()?;
    let ask_price = book.column("ask_price")?.cast(&DataType::Float64)?;
    let ask_price = ask_price.f64()?;
    let ask_size = book.column("ask_size")?.cast(&DataType::Float64)?;
    let ask_size = ask_size.f64()?;

    let n = book.height();
    let mut out_ts: Vec<i64> = Vec::with_capacity(n);
    let mut out_symbol: Vec<String> = Vec::with_capacity(n);
    let mut out_qi: Vec<f64> = Vec::with_capacity(n);
    let mut out_micro: Vec<f64> = Vec::with_capacity(n);
    let mut out_spread: Vec<f64> = Vec::with_capacity(n);
    let mut out_ofi: Vec<f64> = Vec::with_capacity(n);
    let mut out_mid: Vec<f64> = Vec::with_capacity(n);

    // Single pass carrying the previous top-of-book per symbol; the input
    // is grouped by symbol, so one slot of state is enough.
    let mut prev: Option<(String, BookLevel)> = None;

    for idx in 0..n {
        let row = (
            ts.get(idx),
            symbols.get(idx),
            bid_price.get(idx),
            bid_size.get(idx),
            ask_price.get(idx),
            ask_size.get(idx),
        );
        let (Some(t), Some(symbol), Some(bp), Some(bq), Some(ap), Some(aq)) = row else {
            // Null field: the row has no defined features and breaks the
            // predecessor chain for its symbol.
            prev = None;
            continue;
        };

        let level = BookLevel {
            bid_price: bp,
            bid_size: bq,
            ask_price: ap,
            ask_size: aq,
        };
        let prev_level = match &prev {
            Some((prev_symbol, prev_level)) if prev_symbol == symbol => Some(prev_level),
            _ => None,
        };

        let features = RowFeatures {
            mid: mid(bp, ap),
            spread: spread(bp, ap),
            q_imbalance: q_imbalance(bq, aq),
            microprice: microprice(bp, ap, bq, aq),
            ofi_l1: prev_level.map(|p| ofi_l1(&level, p)),
        };

        if features.defined() {
            out_ts.push(t);
            out_symbol.push(symbol.to_string());
            out_qi.push(features.q_imbalance.unwrap_or_default());
            out_micro.push(features.microprice.unwrap_or_default());
            out_spread.push(features.spread);
            out_ofi.push(features.ofi_l1.unwrap_or_default());
            out_mid.push(features.mid);
        }

        prev = Some((symbol.to_string(), level));
    }

    debug!(
        "Computed features for {} of {} snapshots",
        out_ts.len(),
        n
    );

    let df = DataFrame::new(vec![
        Column::new(TIMESTAMP_NS.into(), out_ts),
        Column::new("symbol".into(), out_symbol),
        Column::new("q_imbalance".into(), out_qi),
        Column::new("microprice".into(), out_micro),
        Column::new("spread".into(), out_spread),
        Column::new("ofi_l1".into(), out_ofi),
        Column::new("mid".into(), out_mid),
    ])?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_frame(
        ts: Vec<i64>,
        symbol: Vec<&str>,
        bid_price: Vec<f64>,
        bid_size: Vec<f64>,
        ask_price: Vec<f64>,
        ask_size: Vec<f64>,
    ) -> DataFrame {
        DataFrame::new(vec![
            Column::new(TIMESTAMP_NS.into(), ts),
            Column::new("symbol".into(), symbol),
            Column::new("bid_price".into(), bid_price),
            Column::new("bid_size".into(), bid_size),
            Column::new("ask_price".into(), ask_price),
            Column::new("ask_size".into(), ask_size),
        ])
        .unwrap()
    }

    fn column_values(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_single_symbol_scenario() {
        // Four snapshots of "X"; the first has no predecessor and is dropped
        let book = book_frame(
            vec![0, 1, 2, 3],
            vec!["X", "X", "X", "X"],
            vec![99.0, 99.0, 100.0, 100.0],
            vec![10.0, 11.0, 12.0, 13.0],
            vec![101.0, 101.0, 101.0, 102.0],
            vec![9.0, 8.0, 8.0, 7.0],
        );
        let feats = compute_features(&book).unwrap();

        assert_eq!(feats.height(), 3);
        assert_eq!(feats.get_column_names_str(), FEATURE_COLUMNS.to_vec());

        let mids = column_values(&feats, "mid");
        let spreads = column_values(&feats, "spread");
        let qis = column_values(&feats, "q_imbalance");
        let ofis = column_values(&feats, "ofi_l1");

        // t=1: mid=100, spread=2, qi=(11-8)/19, ofi=(11-10)-(8-9)=2
        assert_eq!(mids[0], 100.0);
        assert_eq!(spreads[0], 2.0);
        assert!((qis[0] - 3.0 / 19.0).abs() < 1e-12);
        assert_eq!(ofis[0], 2.0);

        // t=2: bid improved 99->100 so term_bid=12; ask unchanged with
        // equal size so term_ask=0
        assert_eq!(mids[1], 100.5);
        assert_eq!(spreads[1], 1.0);
        assert_eq!(ofis[1], 12.0);

        // t=3: bid unchanged so term_bid=13-12=1; ask retreated 101->102
        // so term_ask=0
        assert_eq!(mids[2], 101.0);
        assert_eq!(spreads[2], 2.0);
        assert_eq!(ofis[2], 1.0);
    }

    #[test]
    fn test_first_snapshot_per_symbol_dropped() {
        let book = book_frame(
            vec![0, 1, 0, 1],
            vec!["A", "A", "B", "B"],
            vec![10.0, 10.0, 20.0, 20.0],
            vec![1.0, 1.0, 1.0, 1.0],
            vec![11.0, 11.0, 21.0, 21.0],
            vec![1.0, 1.0, 1.0, 1.0],
        );
        let feats = compute_features(&book).unwrap();

        // One retained row per symbol; the symbol boundary resets the
        // predecessor state
        assert_eq!(feats.height(), 2);
        let ts: Vec<i64> = feats
            .column(TIMESTAMP_NS)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(ts, vec![1, 1]);
    }

    #[test]
    fn test_zero_total_size_dropped() {
        let book = book_frame(
            vec![0, 1, 2],
            vec!["X", "X", "X"],
            vec![99.0, 99.0, 99.0],
            vec![1.0, 0.0, 1.0],
            vec![101.0, 101.0, 101.0],
            vec![1.0, 0.0, 1.0],
        );
        let feats = compute_features(&book).unwrap();

        // t=0 lacks a predecessor, t=1 has zero total size
        assert_eq!(feats.height(), 1);
        assert_eq!(
            feats.column(TIMESTAMP_NS).unwrap().i64().unwrap().get(0),
            Some(2)
        );
    }

    #[test]
    fn test_q_imbalance_bounded() {
        let book = book_frame(
            vec![0, 1, 2, 3],
            vec!["X", "X", "X", "X"],
            vec![99.0, 99.0, 99.0, 99.0],
            vec![5.0, 0.0, 100.0, 3.0],
            vec![101.0, 101.0, 101.0, 101.0],
            vec![5.0, 10.0, 0.0, 3.0],
        );
        let feats = compute_features(&book).unwrap();
        for qi in column_values(&feats, "q_imbalance") {
            assert!((-1.0..=1.0).contains(&qi));
        }
        for (i, m) in column_values(&feats, "mid").iter().enumerate() {
            assert_eq!(*m, 100.0, "row {i}");
        }
    }

    #[test]
    fn test_missing_column_aborts() {
        let df = DataFrame::new(vec![
            Column::new(TIMESTAMP_NS.into(), vec![0i64]),
            Column::new("symbol".into(), vec!["X"]),
            Column::new("bid_price".into(), vec![99.0f64]),
            Column::new("bid_size".into(), vec![1.0f64]),
            Column::new("ask_price".into(), vec![101.0f64]),
        ])
        .unwrap();
        let err = compute_features(&df).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(name) if name == "ask_size"));
    }

    #[test]
    fn test_integer_price_columns_accepted() {
        let book = DataFrame::new(vec![
            Column::new(TIMESTAMP_NS.into(), vec![0i64, 1]),
            Column::new("symbol".into(), vec!["X", "X"]),
            Column::new("bid_price".into(), vec![99i64, 99]),
            Column::new("bid_size".into(), vec![10i64, 11]),
            Column::new("ask_price".into(), vec![101i64, 101]),
            Column::new("ask_size".into(), vec![9i64, 8]),
        ])
        .unwrap();
        let feats = compute_features(&book).unwrap();
        assert_eq!(feats.height(), 1);
        assert_eq!(column_values(&feats, "ofi_l1"), vec![2.0]);
    }

    #[test]
    fn test_microprice_leans_toward_thin_side() {
        // More bid size pushes the microprice toward the ask
        let mp = microprice(100.0, 101.0, 10.0, 5.0).unwrap();
        assert!(mp > mid(100.0, 101.0));
        assert!(mp < 101.0);

        assert_eq!(microprice(100.0, 101.0, 0.0, 0.0), None);
        assert_eq!(q_imbalance(0.0, 0.0), None);
    }
}
