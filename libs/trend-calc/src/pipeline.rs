//! Trend Pipeline
//!
//! Orchestrates the stages over a validated series:
//!
//! 1. derived columns per (metric, window)
//! 2. percentages and trend symbols
//! 3. zero-movement resolution
//!
//! then attaches a qualitative signal to every trend cell. Requests are
//! checked against the registry and the series before anything is computed.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::classifier::{ClassifiedColumns, TrendClassifier, TrendSymbol};
use crate::derived::{DerivedColumns, DerivedMetricsEngine};
use crate::error::{Result, TrendError};
use crate::polarity::{qual_signal, QualSignal};
use crate::registry::{MetricRegistry, MetricSpec};
use crate::resolver::ZeroMovementResolver;
use crate::series::TimeSeries;
use crate::window::{Tier, Window, WindowSet};

/// Fully processed column family for one (metric, window) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendFamily {
    pub columns: ClassifiedColumns,
    pub tier: Tier,
    pub signal: Vec<QualSignal>,
}

impl TrendFamily {
    pub fn metric(&self) -> &str {
        &self.columns.derived.metric
    }

    pub fn window(&self) -> Window {
        self.columns.derived.window
    }

    pub fn derived(&self) -> &DerivedColumns {
        &self.columns.derived
    }
}

/// Raw input column carried alongside the derived families
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricColumn {
    pub spec: MetricSpec,
    pub values: Vec<Option<f64>>,
}

/// One cell of the output: a (date, metric, window) triple
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRow<'a> {
    pub date: NaiveDate,
    pub metric: &'a str,
    pub window: Window,
    pub tier: Tier,
    pub value: Option<f64>,
    pub diff: Option<f64>,
    pub rel_change: Option<f64>,
    pub rel_change_pct: Option<f64>,
    pub rel_change_trend: TrendSymbol,
    /// Stage-one proportion, before zero-movement resolution
    pub rel_change_of_diff: Option<f64>,
    /// Resolved percentage the trend is read from
    pub rel_change_of_diff_pct: Option<f64>,
    pub rolling_avg: Option<f64>,
    pub trend: TrendSymbol,
    pub signal: QualSignal,
}

/// Pipeline output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub dates: Vec<NaiveDate>,
    pub metrics: Vec<MetricColumn>,
    /// Ordered by metric (request order) then window (ascending)
    pub families: Vec<TrendFamily>,
}

impl TrendReport {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn metric(&self, name: &str) -> Option<&MetricColumn> {
        self.metrics.iter().find(|m| m.spec.name == name)
    }

    pub fn family(&self, metric: &str, window: Window) -> Option<&TrendFamily> {
        self.families
            .iter()
            .find(|f| f.metric() == metric && f.window() == window)
    }

    pub fn families_for<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = &'a TrendFamily> {
        self.families.iter().filter(move |f| f.metric() == metric)
    }

    /// Cell view of a single family row
    ///
    /// `None` when `row` is out of range for the report or the family.
    pub fn row<'a>(&'a self, family: &'a TrendFamily, row: usize) -> Option<DerivedRow<'a>> {
        let date = *self.dates.get(row)?;
        let columns = &family.columns;
        let derived = &columns.derived;
        let value = self
            .metric(&derived.metric)
            .and_then(|m| m.values.get(row).copied().flatten());
        let rolling_avg = match &derived.rolling_avg {
            Some(avg) => *avg.get(row)?,
            None => None,
        };

        Some(DerivedRow {
            date,
            metric: &derived.metric,
            window: derived.window,
            tier: family.tier,
            value,
            diff: *derived.diff.get(row)?,
            rel_change: *derived.rel_change.get(row)?,
            rel_change_pct: *columns.rel_change_pct.get(row)?,
            rel_change_trend: *columns.rel_change_trend.get(row)?,
            rel_change_of_diff: *derived.rel_change_of_diff.get(row)?,
            rel_change_of_diff_pct: *columns.rel_change_of_diff_pct.get(row)?,
            rolling_avg,
            trend: *columns.trend.get(row)?,
            signal: *family.signal.get(row)?,
        })
    }

    /// All cells, by date, then metric, then window
    pub fn rows(&self) -> impl Iterator<Item = DerivedRow<'_>> + '_ {
        (0..self.dates.len()).flat_map(move |row| {
            self.families
                .iter()
                .filter_map(move |family| self.row(family, row))
        })
    }
}

/// Trend pipeline bound to one registry and window set
pub struct TrendPipeline {
    registry: MetricRegistry,
    windows: WindowSet,
    engine: DerivedMetricsEngine,
    classifier: TrendClassifier,
    resolver: ZeroMovementResolver,
}

impl TrendPipeline {
    pub fn new(registry: MetricRegistry, windows: WindowSet) -> Self {
        Self {
            registry,
            windows,
            engine: DerivedMetricsEngine::new(),
            classifier: TrendClassifier::new(),
            resolver: ZeroMovementResolver::new(),
        }
    }

    /// Reference registry with 1- and 7-day windows
    pub fn reference() -> Self {
        Self::new(MetricRegistry::reference(), WindowSet::reference())
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    /// Check that every requested metric is registered
    pub fn validate_request<S: AsRef<str>>(&self, metrics: &[S]) -> Result<Vec<MetricSpec>> {
        if metrics.is_empty() {
            return Err(TrendError::configuration("no metric requested"));
        }
        let mut seen = HashSet::with_capacity(metrics.len());
        let mut specs = Vec::with_capacity(metrics.len());
        for name in metrics {
            let name = name.as_ref();
            let spec = self.registry.require(name)?;
            if !seen.insert(name) {
                return Err(TrendError::configuration(format!(
                    "metric '{}' requested twice",
                    name
                )));
            }
            specs.push(spec.clone());
        }
        Ok(specs)
    }

    /// Check that the series carries a column for every requested metric
    pub fn validate_series(&self, series: &TimeSeries, specs: &[MetricSpec]) -> Result<()> {
        for spec in specs {
            series.require_column(&spec.name)?;
        }
        Ok(())
    }

    /// Run every registered metric
    pub fn run(&self, series: &TimeSeries) -> Result<TrendReport> {
        let names: Vec<&str> = self.registry.names().collect();
        self.run_for(series, &names)
    }

    /// Run the requested metrics, in request order
    pub fn run_for<S: AsRef<str>>(
        &self,
        series: &TimeSeries,
        metrics: &[S],
    ) -> Result<TrendReport> {
        let specs = self.validate_request(metrics)?;
        self.validate_series(series, &specs)?;

        let derived = self.derive(series, &specs)?;
        let mut classified = self.classify(derived);
        let resolved = self.resolve(&mut classified);
        let families = self.attach_signals(classified)?;

        info!(
            rows = series.len(),
            metrics = specs.len(),
            windows = self.windows.len(),
            resolved,
            "trend pipeline complete"
        );

        let metrics = specs
            .into_iter()
            .map(|spec| {
                let values = series.require_column(&spec.name)?.to_vec();
                Ok(MetricColumn { spec, values })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TrendReport {
            dates: series.dates().to_vec(),
            metrics,
            families,
        })
    }

    /// Stage 1: raw derived columns
    pub fn derive(&self, series: &TimeSeries, specs: &[MetricSpec]) -> Result<Vec<DerivedColumns>> {
        let mut families = Vec::with_capacity(specs.len() * self.windows.len());
        for spec in specs {
            let values = series.require_column(&spec.name)?;
            for window in self.windows.iter() {
                families.push(self.engine.compute(spec, values, window));
            }
        }
        debug!(families = families.len(), "stage 1: derived columns");
        Ok(families)
    }

    /// Stage 2: percentages and trend symbols
    pub fn classify(&self, derived: Vec<DerivedColumns>) -> Vec<ClassifiedColumns> {
        let classified: Vec<_> = derived
            .into_iter()
            .map(|d| self.classifier.classify_columns(d))
            .collect();
        debug!(families = classified.len(), "stage 2: classified");
        classified
    }

    /// Stage 3: zero-movement resolution, returns the number of forced cells
    pub fn resolve(&self, classified: &mut [ClassifiedColumns]) -> usize {
        let resolved = classified
            .iter_mut()
            .map(|c| self.resolver.resolve(c))
            .sum();
        debug!(resolved, "stage 3: zero movement");
        resolved
    }

    fn attach_signals(&self, classified: Vec<ClassifiedColumns>) -> Result<Vec<TrendFamily>> {
        classified
            .into_iter()
            .map(|columns| {
                let spec = self.registry.require(&columns.derived.metric)?;
                let tier = self.windows.tier(columns.derived.window);
                let signal = columns
                    .trend
                    .iter()
                    .map(|&t| qual_signal(t, tier, spec.reverse_polarity))
                    .collect();
                Ok(TrendFamily {
                    columns,
                    tier,
                    signal,
                })
            })
            .collect()
    }
}

impl Default for TrendPipeline {
    fn default() -> Self {
        Self::reference()
    }
}
