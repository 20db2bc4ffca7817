//! Daily time series input
//!
//! Rows arrive one per calendar date; storage is columnar so each metric can
//! be walked as a contiguous slice by the derived-metrics engine.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrendError};

/// One dated row of raw metric values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub values: HashMap<String, Option<f64>>,
}

impl Observation {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, metric: impl Into<String>, value: Option<f64>) -> Self {
        self.values.insert(metric.into(), value);
        self
    }

    pub fn set(&mut self, metric: impl Into<String>, value: Option<f64>) {
        self.values.insert(metric.into(), value);
    }
}

/// Immutable, validated daily series
///
/// Dates are unique and strictly increasing. Gaps are not filled. A column
/// exists if at least one row carries the metric key, and rows that do not
/// carry it read as no value.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl TimeSeries {
    pub fn from_rows(rows: Vec<Observation>) -> Result<Self> {
        for pair in rows.windows(2) {
            let (prev, next) = (pair[0].date, pair[1].date);
            if next == prev {
                return Err(TrendError::invalid_input(format!(
                    "duplicate date {}",
                    next
                )));
            }
            if next < prev {
                return Err(TrendError::invalid_input(format!(
                    "dates not increasing: {} follows {}",
                    next, prev
                )));
            }
        }

        let len = rows.len();
        let mut columns: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
        let mut dates = Vec::with_capacity(len);

        for (row, observation) in rows.into_iter().enumerate() {
            dates.push(observation.date);
            for (metric, value) in observation.values {
                let column = columns.entry(metric).or_insert_with(|| vec![None; len]);
                // NaN and infinities are not usable observations
                column[row] = value.filter(|v| v.is_finite());
            }
        }

        Ok(Self { dates, columns })
    }

    /// Single-metric series over consecutive dates, mostly for tests and tools
    pub fn from_values(
        metric: &str,
        start: NaiveDate,
        values: &[Option<f64>],
    ) -> Result<Self> {
        let rows = start
            .iter_days()
            .zip(values)
            .map(|(date, &value)| Observation::new(date).with(metric, value))
            .collect();
        Self::from_rows(rows)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn has_column(&self, metric: &str) -> bool {
        self.columns.contains_key(metric)
    }

    pub fn column(&self, metric: &str) -> Option<&[Option<f64>]> {
        self.columns.get(metric).map(Vec::as_slice)
    }

    /// Column lookup that fails with `InvalidInput` when the metric is absent
    pub fn require_column(&self, metric: &str) -> Result<&[Option<f64>]> {
        self.column(metric).ok_or_else(|| {
            TrendError::invalid_input(format!("metric column '{}' absent from input", metric))
        })
    }

    pub fn value(&self, metric: &str, row: usize) -> Option<f64> {
        self.columns.get(metric)?.get(row).copied().flatten()
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}
