//! Lookback windows and their interpretation tier

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrendError};

/// Lookback length in days (always > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Window(u32);

impl Window {
    pub fn new(days: u32) -> Result<Self> {
        if days == 0 {
            return Err(TrendError::configuration("window must be at least one day"));
        }
        Ok(Self(days))
    }

    pub fn days(self) -> u32 {
        self.0
    }

    /// Row offset used for lookbacks
    pub fn offset(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u32> for Window {
    type Error = TrendError;

    fn try_from(days: u32) -> Result<Self> {
        Self::new(days)
    }
}

impl From<Window> for u32 {
    fn from(window: Window) -> Self {
        window.0
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}j", self.0)
    }
}

/// How movement over a window is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Smallest configured window: movement is an alarm
    Short,
    /// Any larger window: movement confirms an established trend
    Long,
}

/// Ascending, de-duplicated set of windows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSet {
    windows: Vec<Window>,
}

impl WindowSet {
    pub fn new(days: &[u32]) -> Result<Self> {
        if days.is_empty() {
            return Err(TrendError::configuration("at least one window is required"));
        }
        let mut windows = days
            .iter()
            .map(|&d| Window::new(d))
            .collect::<Result<Vec<_>>>()?;
        windows.sort_unstable();
        let before = windows.len();
        windows.dedup();
        if windows.len() != before {
            return Err(TrendError::configuration(format!(
                "duplicate window in {:?}",
                days
            )));
        }
        Ok(Self { windows })
    }

    /// Reference windows: 1 and 7 days
    pub fn reference() -> Self {
        Self {
            windows: vec![Window(1), Window(7)],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Window> + '_ {
        self.windows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn contains(&self, window: Window) -> bool {
        self.windows.contains(&window)
    }

    pub fn shortest(&self) -> Window {
        // non-empty by construction
        self.windows[0]
    }

    pub fn tier(&self, window: Window) -> Tier {
        if window == self.shortest() {
            Tier::Short
        } else {
            Tier::Long
        }
    }
}

impl Default for WindowSet {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_window_rejected() {
        assert!(Window::new(0).is_err());
        assert!(serde_json::from_str::<Window>("0").is_err());
        assert_eq!(serde_json::from_str::<Window>("7").unwrap().days(), 7);
    }

    #[test]
    fn test_window_set_sorted() {
        let set = WindowSet::new(&[7, 1, 14]).unwrap();
        let days: Vec<_> = set.iter().map(Window::days).collect();
        assert_eq!(days, vec![1, 7, 14]);
    }

    #[test]
    fn test_window_set_rejects_duplicates_and_empty() {
        assert!(WindowSet::new(&[1, 7, 1]).is_err());
        assert!(WindowSet::new(&[]).is_err());
    }

    #[test]
    fn test_tiers() {
        let set = WindowSet::reference();
        assert_eq!(set.tier(Window::new(1).unwrap()), Tier::Short);
        assert_eq!(set.tier(Window::new(7).unwrap()), Tier::Long);

        let set = WindowSet::new(&[3, 14]).unwrap();
        assert_eq!(set.tier(Window::new(3).unwrap()), Tier::Short);
        assert_eq!(set.tier(Window::new(14).unwrap()), Tier::Long);
    }

    #[test]
    fn test_window_display() {
        assert_eq!(Window::new(7).unwrap().to_string(), "7j");
    }
}
