//! trend-calc - Derived metrics and trend classification for daily series
//!
//! Computes, per tracked metric and per lookback window, absolute change,
//! relative change, relative change of the change and a trailing rolling
//! average, then buckets the change into a trend symbol and maps it to a
//! good/bad/unknown signal for display.
//!
//! # Stages
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | 1 | `derived` | `diff`, `rel_change`, `rel_change_of_diff`, `rolling_avg` |
//! | 2 | `classifier` | percentages, `TrendSymbol` |
//! | 3 | `resolver` | 0/0 cells forced to `Flat` |
//! | - | `polarity` | `QualSignal` per trend cell |
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use trend_calc::{TimeSeries, TrendPipeline, TrendSymbol, Window};
//!
//! let start = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
//! let values = [100.0, 105.0, 95.0, 95.0, 95.0].map(Some);
//! let series = TimeSeries::from_values("hospitalises", start, &values).unwrap();
//!
//! let report = TrendPipeline::reference()
//!     .run_for(&series, &["hospitalises"])
//!     .unwrap();
//! let daily = report
//!     .family("hospitalises", Window::new(1).unwrap())
//!     .unwrap();
//!
//! assert_eq!(daily.derived().diff[2], Some(-10.0));
//! assert_eq!(daily.columns.trend[4], TrendSymbol::Flat);
//! ```

pub mod classifier;
pub mod derived;
pub mod error;
pub mod functions;
pub mod pipeline;
pub mod polarity;
pub mod registry;
pub mod resolver;
pub mod series;
pub mod window;

// Re-exports for convenience
pub use classifier::{classify, ClassifiedColumns, TrendClassifier, TrendSymbol};
pub use derived::{DerivedColumns, DerivedMetricsEngine};
pub use error::{Result, TrendError};
pub use pipeline::{DerivedRow, MetricColumn, TrendFamily, TrendPipeline, TrendReport};
pub use polarity::{qual_signal, QualSignal};
pub use registry::{MetricRegistry, MetricSpec};
pub use resolver::ZeroMovementResolver;
pub use series::{Observation, TimeSeries};
pub use window::{Tier, Window, WindowSet};
