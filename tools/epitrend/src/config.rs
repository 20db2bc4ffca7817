//! Configuration loading
//!
//! Layering, lowest priority first: built-in defaults, YAML file,
//! `EPITREND_*` environment variables (nested keys split on `__`, e.g.
//! `EPITREND_LOGGING__LEVEL=debug`).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use trend_calc::registry::reference_specs;
use trend_calc::{MetricRegistry, MetricSpec, TrendPipeline, WindowSet};

/// Config file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config/epitrend.yaml";

/// Complete tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpitrendConfig {
    #[serde(default = "default_windows")]
    pub windows: Vec<u32>,

    #[serde(default = "reference_specs")]
    pub metrics: Vec<MetricSpec>,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input feed selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// `source_type` of the authoritative feed
    #[serde(default = "default_primary")]
    pub primary: String,

    /// `source_type` of the feed supplying `secondary_fields`
    #[serde(default = "default_secondary")]
    pub secondary: String,

    /// `granularite` kept from both feeds
    #[serde(default = "default_granularity")]
    pub granularity: String,

    #[serde(default = "default_secondary_fields")]
    pub secondary_fields: Vec<String>,

    #[serde(default = "default_input_delimiter")]
    pub delimiter: char,
}

/// Export and report layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_output_delimiter")]
    pub delimiter: char,

    /// Metric order for the trend export and report; registry order if unset
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write a daily log file here
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_windows() -> Vec<u32> {
    vec![1, 7]
}

fn default_primary() -> String {
    "ministere-sante".to_string()
}

fn default_secondary() -> String {
    "opencovid19-fr".to_string()
}

fn default_granularity() -> String {
    "pays".to_string()
}

fn default_secondary_fields() -> Vec<String> {
    vec![
        "nouvelles_hospitalisations".to_string(),
        "nouvelles_reanimations".to_string(),
    ]
}

fn default_input_delimiter() -> char {
    ','
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_output_delimiter() -> char {
    ';'
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EpitrendConfig {
    fn default() -> Self {
        Self {
            windows: default_windows(),
            metrics: reference_specs(),
            source: SourceConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            secondary: default_secondary(),
            granularity: default_granularity(),
            secondary_fields: default_secondary_fields(),
            delimiter: default_input_delimiter(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            delimiter: default_output_delimiter(),
            columns: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

/// CSV delimiters must be a single ASCII byte
fn delimiter_byte(delimiter: char, key: &str) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("{} must be an ASCII character, got '{}'", key, delimiter);
    }
    Ok(delimiter as u8)
}

impl SourceConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        delimiter_byte(self.delimiter, "source.delimiter")
    }
}

impl OutputConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        delimiter_byte(self.delimiter, "output.delimiter")
    }
}

impl EpitrendConfig {
    /// Load configuration
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(EpitrendConfig::default()));

        match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Configuration file not found: {}", path.display());
                }
                figment = figment.merge(Yaml::file(path));
            },
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    figment = figment.merge(Yaml::file(default_path));
                }
            },
        }

        let config: Self = figment
            .merge(Env::prefixed("EPITREND_").split("__"))
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that need no input file
    pub fn validate(&self) -> Result<()> {
        self.source.delimiter_byte()?;
        self.output.delimiter_byte()?;
        Ok(())
    }

    pub fn registry(&self) -> Result<MetricRegistry> {
        MetricRegistry::new(self.metrics.clone()).context("Invalid metric table")
    }

    pub fn window_set(&self) -> Result<WindowSet> {
        WindowSet::new(&self.windows).context("Invalid window list")
    }

    pub fn pipeline(&self) -> Result<TrendPipeline> {
        Ok(TrendPipeline::new(self.registry()?, self.window_set()?))
    }

    /// Output metric order, checked against the registry
    pub fn output_columns(&self, registry: &MetricRegistry) -> Result<Vec<String>> {
        match &self.output.columns {
            Some(columns) => {
                for name in columns {
                    registry.require(name)?;
                }
                Ok(columns.clone())
            },
            None => Ok(registry.names().map(str::to_string).collect()),
        }
    }
}
