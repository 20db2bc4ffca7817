//! MetricSpec registry
//!
//! Static description of every tracked metric: whether it is a running total
//! and whether an increase is the favorable direction. Flags are resolved once
//! when the registry is built; use sites never deal with absent keys.

use std::collections::HashMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrendError};

/// Per-metric configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,

    /// Running total (never gets a rolling average)
    #[serde(default, alias = "total", deserialize_with = "deserialize_flag")]
    pub cumulative: bool,

    /// Increase is the favorable direction (e.g. recoveries)
    #[serde(default, alias = "reverse", deserialize_with = "deserialize_flag")]
    pub reverse_polarity: bool,
}

impl MetricSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cumulative: false,
            reverse_polarity: false,
        }
    }

    pub fn cumulative(mut self) -> Self {
        self.cumulative = true;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse_polarity = true;
        self
    }

    /// Whether a window of `days` gets a trailing rolling average
    pub fn has_rolling_avg(&self, days: u32) -> bool {
        !self.cumulative && days > 1
    }
}

/// Accepts native booleans, 0/1 integers and "true/false/yes/no" strings
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrStringOrInt {
        Bool(bool),
        Int(i64),
        String(String),
    }

    match BoolOrStringOrInt::deserialize(deserializer)? {
        BoolOrStringOrInt::Bool(b) => Ok(b),
        BoolOrStringOrInt::Int(0) => Ok(false),
        BoolOrStringOrInt::Int(1) => Ok(true),
        BoolOrStringOrInt::Int(i) => Err(de::Error::custom(format!(
            "Invalid integer value {}, expected 0 or 1",
            i
        ))),
        BoolOrStringOrInt::String(s) => match s.to_lowercase().trim() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => Err(de::Error::custom(format!(
                "Invalid boolean value '{}', expected: 1/0, true/false, yes/no, or boolean",
                other
            ))),
        },
    }
}

/// Ordered, name-indexed set of metric specs
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRegistry {
    specs: Vec<MetricSpec>,
    index: HashMap<String, usize>,
}

impl MetricRegistry {
    /// Build a registry, rejecting empty or duplicate names
    pub fn new(specs: Vec<MetricSpec>) -> Result<Self> {
        let mut index = HashMap::with_capacity(specs.len());
        for (pos, spec) in specs.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(TrendError::configuration("metric name cannot be empty"));
            }
            if index.insert(spec.name.clone(), pos).is_some() {
                return Err(TrendError::configuration(format!(
                    "duplicate metric spec '{}'",
                    spec.name
                )));
            }
        }
        Ok(Self { specs, index })
    }

    /// The ten metrics tracked by the national daily summary
    pub fn reference() -> Self {
        let specs = reference_specs();
        let index = specs
            .iter()
            .enumerate()
            .map(|(pos, spec)| (spec.name.clone(), pos))
            .collect();
        Self { specs, index }
    }

    pub fn get(&self, name: &str) -> Option<&MetricSpec> {
        self.index.get(name).map(|&pos| &self.specs[pos])
    }

    /// Lookup that fails with `ConfigurationMismatch`
    pub fn require(&self, name: &str) -> Result<&MetricSpec> {
        self.get(name).ok_or_else(|| TrendError::mismatch(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> &[MetricSpec] {
        &self.specs
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::reference()
    }
}

/// Reference metric table in source column order
pub fn reference_specs() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new("cas_confirmes").cumulative(),
        MetricSpec::new("hospitalises"),
        MetricSpec::new("nouvelles_hospitalisations"),
        MetricSpec::new("gueris").cumulative().reversed(),
        MetricSpec::new("reanimation"),
        MetricSpec::new("nouvelles_reanimations"),
        MetricSpec::new("deces").cumulative(),
        MetricSpec::new("cas_ehpad").cumulative(),
        MetricSpec::new("cas_confirmes_ehpad").cumulative(),
        MetricSpec::new("deces_ehpad").cumulative(),
    ]
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_registry() {
        let registry = MetricRegistry::reference();
        assert_eq!(registry.len(), 10);

        let gueris = registry.get("gueris").unwrap();
        assert!(gueris.cumulative);
        assert!(gueris.reverse_polarity);

        let deces = registry.get("deces").unwrap();
        assert!(deces.cumulative);
        assert!(!deces.reverse_polarity);

        let hospitalises = registry.get("hospitalises").unwrap();
        assert!(!hospitalises.cumulative);
        assert!(hospitalises.has_rolling_avg(7));
        assert!(!hospitalises.has_rolling_avg(1));
    }

    #[test]
    fn test_reference_order_is_preserved() {
        let registry = MetricRegistry::reference();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&"cas_confirmes"));
        assert_eq!(names.last(), Some(&"deces_ehpad"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = MetricRegistry::new(vec![MetricSpec::new("deces"), MetricSpec::new("deces")])
            .unwrap_err();
        assert!(matches!(err, TrendError::Configuration(_)));
    }

    #[test]
    fn test_require_unknown_metric() {
        let registry = MetricRegistry::reference();
        let err = registry.require("vaccinations").unwrap_err();
        assert_eq!(err, TrendError::mismatch("vaccinations"));
    }

    #[test]
    fn test_flags_default_to_false() {
        let spec: MetricSpec = serde_yaml::from_str("name: hospitalises").unwrap();
        assert!(!spec.cumulative);
        assert!(!spec.reverse_polarity);
    }

    #[test]
    fn test_flags_accept_short_keys() {
        let yaml = "name: gueris\ntotal: true\nreverse: true\n";
        let spec: MetricSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(spec.cumulative);
        assert!(spec.reverse_polarity);
    }

    #[test]
    fn test_flags_accept_flexible_values() {
        let spec: MetricSpec =
            serde_json::from_str(r#"{"name":"deces","total":1,"reverse":"no"}"#).unwrap();
        assert!(spec.cumulative);
        assert!(!spec.reverse_polarity);

        let bad = serde_json::from_str::<MetricSpec>(r#"{"name":"deces","total":2}"#);
        assert!(bad.is_err());
    }
}
