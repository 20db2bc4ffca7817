//! Trend Classifier
//!
//! Second pipeline stage: converts stored proportions into percentages and
//! buckets each percentage into a trend symbol.
//!
//! | percentage `v`      | symbol    |
//! |---------------------|-----------|
//! | missing             | `Unknown` |
//! | `v < -5`            | `Falling` |
//! | `-5 <= v < 5`       | `Flat`    |
//! | `v >= 5`            | `Rising`  |
//!
//! Larger magnitudes do not produce distinct symbols.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::derived::DerivedColumns;
use crate::functions::to_percent;

/// Half-width, in percent, of the flat band
pub const FLAT_BAND_PCT: f64 = 5.0;

/// Discrete movement bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSymbol {
    Falling,
    Flat,
    Rising,
    Unknown,
}

impl TrendSymbol {
    /// Glyph used in exports and reports
    pub fn glyph(self) -> &'static str {
        match self {
            TrendSymbol::Falling => "⬊",
            TrendSymbol::Flat => "⬌",
            TrendSymbol::Rising => "⬈",
            TrendSymbol::Unknown => "?",
        }
    }

    pub fn is_known(self) -> bool {
        self != TrendSymbol::Unknown
    }
}

impl fmt::Display for TrendSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Bucket one percentage value
pub fn classify(percent: Option<f64>) -> TrendSymbol {
    match percent {
        None => TrendSymbol::Unknown,
        Some(v) if v.is_nan() => TrendSymbol::Unknown,
        Some(v) if v < -FLAT_BAND_PCT => TrendSymbol::Falling,
        Some(v) if v < FLAT_BAND_PCT => TrendSymbol::Flat,
        Some(_) => TrendSymbol::Rising,
    }
}

/// Derived columns plus percentages and trend symbols
///
/// `trend` is the symbol for `rel_change_of_diff`, the one the zero-movement
/// resolver and polarity mapper act on. `rel_change_trend` is carried for
/// reporting only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedColumns {
    pub derived: DerivedColumns,
    pub rel_change_pct: Vec<Option<f64>>,
    pub rel_change_trend: Vec<TrendSymbol>,
    pub rel_change_of_diff_pct: Vec<Option<f64>>,
    pub trend: Vec<TrendSymbol>,
}

/// Stage-two processor: percentages and trend symbols
pub struct TrendClassifier;

impl TrendClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_columns(&self, derived: DerivedColumns) -> ClassifiedColumns {
        let rel_change_pct: Vec<_> = derived.rel_change.iter().map(|&p| to_percent(p)).collect();
        let rel_change_of_diff_pct: Vec<_> = derived
            .rel_change_of_diff
            .iter()
            .map(|&p| to_percent(p))
            .collect();

        let rel_change_trend = rel_change_pct.iter().map(|&v| classify(v)).collect();
        let trend = rel_change_of_diff_pct.iter().map(|&v| classify(v)).collect();

        ClassifiedColumns {
            derived,
            rel_change_pct,
            rel_change_trend,
            rel_change_of_diff_pct,
            trend,
        }
    }
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::window::Window;

    #[test]
    fn test_buckets() {
        assert_eq!(classify(Some(-60.0)), TrendSymbol::Falling);
        assert_eq!(classify(Some(-12.0)), TrendSymbol::Falling);
        assert_eq!(classify(Some(0.0)), TrendSymbol::Flat);
        assert_eq!(classify(Some(4.9999)), TrendSymbol::Flat);
        assert_eq!(classify(Some(12.0)), TrendSymbol::Rising);
        assert_eq!(classify(Some(300.0)), TrendSymbol::Rising);
        assert_eq!(classify(None), TrendSymbol::Unknown);
        assert_eq!(classify(Some(f64::NAN)), TrendSymbol::Unknown);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(Some(-5.0001)), TrendSymbol::Falling);
        assert_eq!(classify(Some(-5.0)), TrendSymbol::Flat);
        assert_eq!(classify(Some(5.0)), TrendSymbol::Rising);
        assert_eq!(classify(Some(5.0001)), TrendSymbol::Rising);
    }

    #[test]
    fn test_magnitude_tiers_collapse() {
        let falling: Vec<_> = [-6.0, -30.0, -75.0].iter().map(|&v| classify(Some(v))).collect();
        assert!(falling.iter().all(|&s| s == TrendSymbol::Falling));

        let rising: Vec<_> = [6.0, 30.0, 75.0].iter().map(|&v| classify(Some(v))).collect();
        assert!(rising.iter().all(|&s| s == TrendSymbol::Rising));
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(TrendSymbol::Falling.to_string(), "⬊");
        assert_eq!(TrendSymbol::Flat.to_string(), "⬌");
        assert_eq!(TrendSymbol::Rising.to_string(), "⬈");
        assert_eq!(TrendSymbol::Unknown.to_string(), "?");
    }

    #[test]
    fn test_classify_columns() {
        let derived = DerivedColumns {
            metric: "hospitalises".to_string(),
            window: Window::new(1).unwrap(),
            diff: vec![None, Some(5.0), Some(-10.0)],
            rel_change: vec![None, Some(0.05), Some(-0.0952)],
            rel_change_of_diff: vec![None, None, Some(-3.0)],
            rolling_avg: None,
        };

        let classified = TrendClassifier::new().classify_columns(derived);
        assert_eq!(classified.rel_change_pct, vec![None, Some(5.0), Some(-9.52)]);
        assert_eq!(
            classified.rel_change_trend,
            vec![TrendSymbol::Unknown, TrendSymbol::Rising, TrendSymbol::Falling]
        );
        assert_eq!(classified.rel_change_of_diff_pct, vec![None, None, Some(-300.0)]);
        assert_eq!(
            classified.trend,
            vec![TrendSymbol::Unknown, TrendSymbol::Unknown, TrendSymbol::Falling]
        );
    }
}
