//! Error types for trend-calc

use thiserror::Error;

/// Trend computation errors
///
/// A missing value is not an error: formulas whose preconditions are not met
/// yield `None` and the pipeline carries on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrendError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration mismatch: metric '{metric}' is not registered")]
    ConfigurationMismatch { metric: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TrendError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn mismatch(metric: impl Into<String>) -> Self {
        Self::ConfigurationMismatch {
            metric: metric.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TrendError>;
