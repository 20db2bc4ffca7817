//! Derived Metrics Engine
//!
//! First pipeline stage: per (metric, window) column family, computes the
//! absolute change, relative change, relative change of the change itself
//! and, for incremental metrics on windows longer than a day, a trailing
//! rolling average. Rows without enough history yield `None`.

use serde::Serialize;
use tracing::debug;

use crate::functions::{difference, mean, pct_change, round4};
use crate::registry::MetricSpec;
use crate::window::Window;

/// Raw derived columns for one (metric, window) pair, one cell per row
///
/// Proportions are stored rounded to four digits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedColumns {
    pub metric: String,
    pub window: Window,
    pub diff: Vec<Option<f64>>,
    pub rel_change: Vec<Option<f64>>,
    pub rel_change_of_diff: Vec<Option<f64>>,
    /// Present only for non-cumulative metrics with window > 1
    pub rolling_avg: Option<Vec<Option<f64>>>,
}

impl DerivedColumns {
    pub fn len(&self) -> usize {
        self.diff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diff.is_empty()
    }
}

/// Value `offset` rows before `row`, if the series reaches that far back
fn lagged(values: &[Option<f64>], row: usize, offset: usize) -> Option<f64> {
    row.checked_sub(offset).and_then(|i| values[i])
}

/// Stage-one processor for derived metric columns
pub struct DerivedMetricsEngine;

impl DerivedMetricsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute the full column family for one metric and window
    pub fn compute(
        &self,
        spec: &MetricSpec,
        values: &[Option<f64>],
        window: Window,
    ) -> DerivedColumns {
        let diff = self.diff(values, window);
        let rel_change = self.rel_change(values, window);
        let rel_change_of_diff = self.rel_change_of_diff(&diff);
        let rolling_avg = spec
            .has_rolling_avg(window.days())
            .then(|| self.rolling_average(values, window));

        debug!(
            metric = %spec.name,
            window = window.days(),
            rows = values.len(),
            defined_diffs = diff.iter().flatten().count(),
            rolling_avg = rolling_avg.is_some(),
            "derived columns"
        );

        DerivedColumns {
            metric: spec.name.clone(),
            window,
            diff,
            rel_change,
            rel_change_of_diff,
            rolling_avg,
        }
    }

    /// `value(row) - value(row - window)`
    pub fn diff(&self, values: &[Option<f64>], window: Window) -> Vec<Option<f64>> {
        (0..values.len())
            .map(|row| difference(values[row], lagged(values, row, window.offset())))
            .collect()
    }

    /// `diff(row) / value(row - window)`, rounded
    pub fn rel_change(&self, values: &[Option<f64>], window: Window) -> Vec<Option<f64>> {
        (0..values.len())
            .map(|row| pct_change(values[row], lagged(values, row, window.offset())).map(round4))
            .collect()
    }

    /// Period-over-period (one row) relative change of the diff series, rounded
    pub fn rel_change_of_diff(&self, diff: &[Option<f64>]) -> Vec<Option<f64>> {
        (0..diff.len())
            .map(|row| pct_change(diff[row], lagged(diff, row, 1)).map(round4))
            .collect()
    }

    /// Mean of the `window` most recent values up to and including each row
    ///
    /// Undefined until `window` rows exist and whenever one of them is missing.
    pub fn rolling_average(&self, values: &[Option<f64>], window: Window) -> Vec<Option<f64>> {
        let n = window.offset();
        (0..values.len())
            .map(|row| {
                if row + 1 < n {
                    return None;
                }
                mean(&values[row + 1 - n..=row]).map(round4)
            })
            .collect()
    }
}

impl Default for DerivedMetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}
