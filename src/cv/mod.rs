//! Purged, embargoed K-fold cross-validation
//!
//! Splits a time-ordered sample domain into K contiguous test blocks and,
//! for each fold, removes training samples whose label horizon overlaps
//! the test span (purging) or that sit just after it (embargo). Works on
//! any nanosecond-indexed samples; it does not depend on the feature
//! extractor.

use polars::prelude::*;

use crate::dataset::normalize_column;
use crate::error::{Error, Result};

/// One train/test partition over original sample positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Purged, embargoed K-fold splitter.
///
/// `horizon_ns` is the forward label-observation window per sample;
/// `embargo_ns` extends the exclusion zone past each test block's end.
/// Both default to zero, which reduces the splitter to plain contiguous
/// K-fold over time ranks.
#[derive(Debug, Clone)]
pub struct PurgedKFold {
    n_splits: usize,
    horizon_ns: i64,
    embargo_ns: i64,
}

impl PurgedKFold {
    /// Create a splitter with no purge horizon and no embargo
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            horizon_ns: 0,
            embargo_ns: 0,
        }
    }

    /// Set the label horizon used for purging
    pub fn with_horizon_ns(mut self, horizon_ns: i64) -> Self {
        self.horizon_ns = horizon_ns;
        self
    }

    /// Set the embargo window after each test block
    pub fn with_embargo_ns(mut self, embargo_ns: i64) -> Self {
        self.embargo_ns = embargo_ns;
        self
    }

    /// Split a nanosecond timestamp domain into K folds.
    ///
    /// Fails fast with [`Error::InvalidSplit`] when `n_splits` is zero or
    /// exceeds the sample count; folds are produced lazily by the returned
    /// iterator, in increasing order of test-block rank.
    pub fn split(&self, ts_ns: &[i64]) -> Result<FoldIter> {
        let n = ts_ns.len();
        if self.n_splits == 0 || self.n_splits > n {
            return Err(Error::InvalidSplit {
                n_splits: self.n_splits,
                n_samples: n,
            });
        }

        // Stable rank order: ties keep original relative order
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| ts_ns[i]);

        // Block sizes n/k, the first n%k blocks one larger
        let base = n / self.n_splits;
        let remainder = n % self.n_splits;
        let mut bounds = Vec::with_capacity(self.n_splits);
        let mut cursor = 0;
        for k in 0..self.n_splits {
            cursor += base + usize::from(k < remainder);
            bounds.push(cursor);
        }

        Ok(FoldIter {
            ts_ns: ts_ns.to_vec(),
            order,
            bounds,
            horizon_ns: self.horizon_ns,
            embargo_ns: self.embargo_ns,
            fold: 0,
            start: 0,
        })
    }

    /// Split a polars column, normalizing datetimes or epoch numbers to
    /// nanoseconds first so `horizon_ns` and `embargo_ns` compare against
    /// the same unit. Convenience for feature or label frames.
    pub fn split_column(&self, col: &Column) -> Result<FoldIter> {
        let ns = normalize_column(col, None)?;
        let ts_ns: Vec<i64> = ns.i64()?.into_iter().flatten().collect();
        if ts_ns.len() != col.len() {
            // Null timestamps have no place on the split axis
            return Err(Error::UnrecognizedTimestampFormat);
        }
        self.split(&ts_ns)
    }
}

/// Lazy fold iterator; each `next` materializes one fold
#[derive(Debug)]
pub struct FoldIter {
    ts_ns: Vec<i64>,
    order: Vec<usize>,
    bounds: Vec<usize>,
    horizon_ns: i64,
    embargo_ns: i64,
    fold: usize,
    start: usize,
}

/// Purge check: the closed horizon interval `[t, horizon_end]` overlaps
/// the closed test span `[test_start, test_end]`.
fn horizon_overlaps_test(t: i64, horizon_end: i64, test_start: i64, test_end: i64) -> bool {
    t <= test_end && horizon_end >= test_start
}

/// Embargo check: `t` lies in the half-open window `(test_end, embargo_end]`
fn in_embargo_window(t: i64, test_end: i64, embargo_end: i64) -> bool {
    t > test_end && t <= embargo_end
}

impl Iterator for FoldIter {
    type Item = Fold;

    fn next(&mut self) -> Option<Fold> {
        let end = *self.bounds.get(self.fold)?;
        let test: Vec<usize> = self.order[self.start..end].to_vec();
        self.start = end;
        self.fold += 1;

        // Raw test span; the embargo extends past it but never moves it
        let test_start = test.iter().map(|&i| self.ts_ns[i]).min()?;
        let test_end = test.iter().map(|&i| self.ts_ns[i]).max()?;
        let embargo_end = test_end + self.embargo_ns;

        let mut in_test = vec![false; self.ts_ns.len()];
        for &i in &test {
            in_test[i] = true;
        }

        let train: Vec<usize> = (0..self.ts_ns.len())
            .filter(|&i| {
                if in_test[i] {
                    return false;
                }
                let t = self.ts_ns[i];
                !horizon_overlaps_test(t, t + self.horizon_ns, test_start, test_end)
                    && !in_embargo_window(t, test_end, embargo_end)
            })
            .collect();

        Some(Fold { train, test })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bounds.len() - self.fold;
        (remaining, Some(remaining))
    }
}
