//! Timestamp normalization for raw snapshot tables.
//!
//! Inputs arrive with the timestamp column in whatever shape the capture
//! produced: native datetimes, ISO 8601 strings, or epoch integers of
//! unknown unit. Everything downstream works on canonical i64 nanoseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use polars::prelude::*;

use crate::error::{Error, Result};

/// Canonical nanosecond timestamp column name
pub const TIMESTAMP_NS: &str = "timestamp_ns";

/// Epoch unit of a numeric timestamp column
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimestampUnit {
    /// Epoch seconds
    Seconds,
    /// Epoch milliseconds
    Millis,
    /// Epoch microseconds
    Micros,
    /// Epoch nanoseconds
    Nanos,
}

impl TimestampUnit {
    /// Nanoseconds per unit
    pub fn to_nanos(self) -> i64 {
        match self {
            TimestampUnit::Seconds => 1_000_000_000,
            TimestampUnit::Millis => 1_000_000,
            TimestampUnit::Micros => 1_000,
            TimestampUnit::Nanos => 1,
        }
    }

    /// Guess the unit from the largest epoch value in a column.
    ///
    /// Magnitude heuristic: ~1e9 is seconds, ~1e12 ms, ~1e15 us, ~1e18 ns.
    /// One unit is inferred for the whole column; mixed units within a
    /// single column are not detected.
    pub fn infer(max_value: f64) -> Self {
        if max_value < 1e12 {
            TimestampUnit::Seconds
        } else if max_value < 1e13 {
            TimestampUnit::Millis
        } else if max_value < 1e16 {
            TimestampUnit::Micros
        } else {
            TimestampUnit::Nanos
        }
    }
}

/// Normalize a timestamp column to i64 nanoseconds, named [`TIMESTAMP_NS`].
///
/// Strategy, in order:
/// 1. Native datetime/date dtype: loss-free cast to nanoseconds.
/// 2. String dtype: parse each value as a calendar timestamp; if at least
///    one value parses the whole column is treated as textual and
///    unparseable values become null.
/// 3. Numeric dtype (or strings that parse as numbers): apply one scale to
///    the whole column, from `unit` when given, otherwise inferred from
///    the column maximum.
///
/// Fails with [`Error::UnrecognizedTimestampFormat`] when no strategy
/// yields any valid value; no partial output is produced.
pub fn normalize_column(col: &Column, unit: Option<TimestampUnit>) -> Result<Column> {
    match col.dtype() {
        DataType::Datetime(_, _) | DataType::Date => {
            let mut ns = col
                .cast(&DataType::Datetime(TimeUnit::Nanoseconds, None))?
                .cast(&DataType::Int64)?;
            ns.rename(TIMESTAMP_NS.into());
            Ok(ns)
        }
        DataType::String => {
            let ca = col.str()?;
            let parsed: Vec<Option<i64>> = ca
                .into_iter()
                .map(|v| v.and_then(parse_datetime_ns))
                .collect();
            if parsed.iter().any(Option::is_some) {
                return Ok(Column::new(TIMESTAMP_NS.into(), parsed));
            }
            // No calendar timestamps; the strings may still be epoch numbers
            let integers: Vec<Option<i64>> = ca
                .into_iter()
                .map(|v| v.and_then(|s| s.trim().parse::<i64>().ok()))
                .collect();
            let floats: Vec<Option<f64>> = ca
                .into_iter()
                .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect();
            let any_float_only = integers
                .iter()
                .zip(&floats)
                .any(|(i, f)| i.is_none() && f.is_some());
            if any_float_only {
                scale_float(floats, unit)
            } else {
                scale_integer(integers, unit)
            }
        }
        dt if dt.is_integer() => {
            // Stay in i64: epoch nanoseconds exceed 2^53 and would lose
            // precision on a round-trip through f64
            let casted = col.cast(&DataType::Int64)?;
            let values: Vec<Option<i64>> = casted.i64()?.into_iter().collect();
            scale_integer(values, unit)
        }
        dt if dt.is_float() => {
            let casted = col.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = casted.f64()?.into_iter().collect();
            scale_float(values, unit)
        }
        _ => Err(Error::UnrecognizedTimestampFormat),
    }
}

/// Scale integer epoch values to nanoseconds with a single column-wide unit.
fn scale_integer(values: Vec<Option<i64>>, unit: Option<TimestampUnit>) -> Result<Column> {
    let max = values
        .iter()
        .flatten()
        .copied()
        .max()
        .ok_or(Error::UnrecognizedTimestampFormat)?;
    let unit = unit.unwrap_or_else(|| TimestampUnit::infer(max as f64));
    let scale = unit.to_nanos();
    let scaled: Vec<Option<i64>> = values
        .into_iter()
        .map(|v| v.map(|x| x.saturating_mul(scale)))
        .collect();
    Ok(Column::new(TIMESTAMP_NS.into(), scaled))
}

/// Scale float epoch values to nanoseconds with a single column-wide unit.
fn scale_float(values: Vec<Option<f64>>, unit: Option<TimestampUnit>) -> Result<Column> {
    let max = values
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(Error::UnrecognizedTimestampFormat);
    }
    let unit = unit.unwrap_or_else(|| TimestampUnit::infer(max));
    let scale = unit.to_nanos() as f64;
    let scaled: Vec<Option<i64>> = values
        .into_iter()
        .map(|v| v.map(|x| (x * scale) as i64))
        .collect();
    Ok(Column::new(TIMESTAMP_NS.into(), scaled))
}

/// Parse a single textual timestamp to epoch nanoseconds (UTC).
fn parse_datetime_ns(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.timestamp_nanos_opt();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return dt.and_utc().timestamp_nanos_opt();
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_nanos_opt();
    }
    None
}
