//! Polarity Mapper
//!
//! Turns a trend symbol into a presentation signal. The short window reads a
//! rise as bad news; the long window reads a rise as confirmation and maps it
//! to good. Metrics with reverse polarity swap good and bad. Flat and unknown
//! trends never carry a signal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classifier::TrendSymbol;
use crate::window::Tier;

/// Qualitative reading of a trend, used only for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualSignal {
    Good,
    Bad,
    Unknown,
}

impl QualSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            QualSignal::Good => "good",
            QualSignal::Bad => "bad",
            QualSignal::Unknown => "unknown",
        }
    }

    /// Good <-> Bad, Unknown unchanged
    pub fn flipped(self) -> Self {
        match self {
            QualSignal::Good => QualSignal::Bad,
            QualSignal::Bad => QualSignal::Good,
            QualSignal::Unknown => QualSignal::Unknown,
        }
    }
}

impl fmt::Display for QualSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a trend to a signal for the given tier and metric polarity
pub fn qual_signal(trend: TrendSymbol, tier: Tier, reverse_polarity: bool) -> QualSignal {
    let base = match (tier, trend) {
        (Tier::Short, TrendSymbol::Rising) => QualSignal::Bad,
        (Tier::Short, TrendSymbol::Falling) => QualSignal::Good,
        (Tier::Long, TrendSymbol::Rising) => QualSignal::Good,
        (Tier::Long, TrendSymbol::Falling) => QualSignal::Bad,
        (_, TrendSymbol::Flat | TrendSymbol::Unknown) => QualSignal::Unknown,
    };

    if reverse_polarity {
        base.flipped()
    } else {
        base
    }
}
