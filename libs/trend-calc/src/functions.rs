//! Stateless numeric helpers shared by the pipeline stages
//!
//! Every helper takes and returns `Option<f64>` where a value may be missing;
//! `None` is never coerced to zero.

/// Decimal digits kept for stored proportions and percentages
pub const PRECISION: i32 = 4;

/// Round to `decimals` places, ties to even
///
/// Never returns negative zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    let rounded = (value * factor).round_ties_even() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Round to the stored precision
pub fn round4(value: f64) -> f64 {
    round_to(value, PRECISION)
}

/// Signed difference `current - previous`
pub fn difference(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    Some(current? - previous?)
}

/// Proportional change `(current - previous) / previous`
///
/// `None` when either operand is missing or the base is zero (including -0.0).
pub fn pct_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let (current, previous) = (current?, previous?);
    if previous == 0.0 {
        return None;
    }
    let change = (current - previous) / previous;
    change.is_finite().then_some(change)
}

/// Stored proportion to stored percentage
pub fn to_percent(proportion: Option<f64>) -> Option<f64> {
    proportion.map(|p| round4(p * 100.0))
}

/// Mean of a slice where every element must be present
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sum = 0.0;
    for value in values {
        sum += (*value)?;
    }
    Some(sum / values.len() as f64)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(round_to(3.14159, 0), 3.0);
        assert_eq!(round4(-0.095238095), -0.0952);
    }

    #[test]
    fn test_round_ties_to_even() {
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round_to(-2.5, 0), -2.0);
    }

    #[test]
    fn test_round_never_negative_zero() {
        assert!(round4(-0.00003).is_sign_positive());
        assert!(round4(-0.0).is_sign_positive());
        assert_eq!(round4(-0.00003), 0.0);
        // constant falling diff: 0 / -10
        let flat = pct_change(Some(-10.0), Some(-10.0)).map(round4);
        assert!(flat.is_some_and(f64::is_sign_positive));
        assert!(to_percent(Some(-0.0)).is_some_and(f64::is_sign_positive));
    }

    #[test]
    fn test_difference() {
        assert_eq!(difference(Some(105.0), Some(100.0)), Some(5.0));
        assert_eq!(difference(None, Some(100.0)), None);
        assert_eq!(difference(Some(1.0), None), None);
    }

    #[test]
    fn test_pct_change() {
        assert_eq!(pct_change(Some(105.0), Some(100.0)), Some(0.05));
        assert_eq!(pct_change(Some(0.0), Some(-10.0)), Some(-1.0));
        assert_eq!(pct_change(Some(5.0), None), None);
    }

    #[test]
    fn test_pct_change_zero_base() {
        assert_eq!(pct_change(Some(5.0), Some(0.0)), None);
        assert_eq!(pct_change(Some(5.0), Some(-0.0)), None);
        assert_eq!(pct_change(Some(0.0), Some(0.0)), None);
    }

    #[test]
    fn test_to_percent() {
        assert_eq!(to_percent(Some(-0.0952)), Some(-9.52));
        assert_eq!(to_percent(Some(0.05)), Some(5.0));
        assert_eq!(to_percent(None), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[Some(10.0), Some(20.0), Some(30.0)]), Some(20.0));
        assert_eq!(mean(&[Some(10.0), None]), None);
        assert_eq!(mean(&[]), None);
    }
}
