//! Zero-Movement Resolver
//!
//! Third pipeline stage. When the diff is exactly zero and so was the previous
//! diff, the relative change of the diff is 0/0 and stays unresolved after
//! classification. Those cells are forced to a 0% change and a flat trend.
//! Unknown cells from short history or missing values are left alone. The
//! stage-one proportion in `derived` keeps its raw, undefined value.

use tracing::debug;

use crate::classifier::{ClassifiedColumns, TrendSymbol};

/// Stage-three processor
pub struct ZeroMovementResolver;

impl ZeroMovementResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve 0/0 cells in place, returning how many were forced to flat
    pub fn resolve(&self, columns: &mut ClassifiedColumns) -> usize {
        let diff = &columns.derived.diff;
        let mut resolved = 0;

        for row in 1..diff.len() {
            let still_moving = diff[row] != Some(0.0) || diff[row - 1] != Some(0.0);
            if still_moving || columns.trend[row] != TrendSymbol::Unknown {
                continue;
            }
            columns.rel_change_of_diff_pct[row] = Some(0.0);
            columns.trend[row] = TrendSymbol::Flat;
            resolved += 1;
        }

        if resolved > 0 {
            debug!(
                metric = %columns.derived.metric,
                window = columns.derived.window.days(),
                resolved,
                "zero movement resolved"
            );
        }
        resolved
    }
}

impl Default for ZeroMovementResolver {
    fn default() -> Self {
        Self::new()
    }
}
