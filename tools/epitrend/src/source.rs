//! CSV source loader
//!
//! Reads the daily key-figures CSV, keeps rows of the configured granularity
//! and merges two feeds by date: every metric from the primary feed except
//! the secondary fields, which come from the secondary feed.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info, warn};
use trend_calc::{Observation, TimeSeries};

use crate::config::SourceConfig;

const DATE_COLUMN: &str = "date";
const GRANULARITY_COLUMN: &str = "granularite";
const SOURCE_TYPE_COLUMN: &str = "source_type";

/// Header positions of the columns the loader reads
struct Layout {
    date: usize,
    granularity: usize,
    source_type: usize,
    metrics: Vec<(String, usize)>,
}

impl Layout {
    fn from_headers(headers: &StringRecord, metrics: &[&str]) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let required =
            |name: &str| find(name).ok_or_else(|| anyhow!("Missing required column '{}'", name));

        let metrics = metrics
            .iter()
            .filter_map(|&name| match find(name) {
                Some(pos) => Some((name.to_string(), pos)),
                None => {
                    warn!("Metric column '{}' not found in source", name);
                    None
                },
            })
            .collect();

        Ok(Self {
            date: required(DATE_COLUMN)?,
            granularity: required(GRANULARITY_COLUMN)?,
            source_type: required(SOURCE_TYPE_COLUMN)?,
            metrics,
        })
    }
}

/// Parse one numeric cell; empty means no value
fn parse_cell(raw: Option<&str>, metric: &str, line: u64) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(metric, line, value = raw, "Unparsable value treated as missing");
            None
        },
    }
}

/// Load and merge the two feeds into one series
pub fn load_time_series(
    path: &Path,
    config: &SourceConfig,
    metrics: &[&str],
) -> Result<TimeSeries> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let series = read_time_series(BufReader::new(file), config, metrics)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    info!(
        rows = series.len(),
        path = %path.display(),
        "Time series loaded"
    );
    Ok(series)
}

/// Reader-based variant of [`load_time_series`]
pub fn read_time_series<R: Read>(
    reader: R,
    config: &SourceConfig,
    metrics: &[&str],
) -> Result<TimeSeries> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter_byte()?)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let layout = Layout::from_headers(&headers, metrics)?;
    let is_secondary_field = |name: &str| config.secondary_fields.iter().any(|f| f == name);

    let mut primary: Vec<Observation> = Vec::new();
    let mut secondary: HashMap<NaiveDate, StringRecord> = HashMap::new();
    let mut skipped = 0usize;

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.get(layout.granularity).map(str::trim) != Some(config.granularity.as_str()) {
            skipped += 1;
            continue;
        }

        let source_type = record.get(layout.source_type).map(str::trim).unwrap_or("");
        let is_primary = source_type == config.primary;
        if !is_primary && source_type != config.secondary {
            skipped += 1;
            continue;
        }

        let raw_date = record.get(layout.date).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}' on line {}", raw_date, line))?;

        if is_primary {
            let mut observation = Observation::new(date);
            for (name, pos) in &layout.metrics {
                if !is_secondary_field(name) {
                    observation.set(name.clone(), parse_cell(record.get(*pos), name, line));
                }
            }
            primary.push(observation);
        } else if secondary.contains_key(&date) {
            warn!(%date, line, "Duplicate secondary row ignored");
        } else {
            secondary.insert(date, record);
        }
    }

    debug!(
        primary = primary.len(),
        secondary = secondary.len(),
        skipped,
        "Source rows split"
    );

    for observation in &mut primary {
        let extra = secondary.get(&observation.date);
        for (name, pos) in &layout.metrics {
            if is_secondary_field(name) {
                let line = extra.and_then(|r| r.position()).map(|p| p.line()).unwrap_or(0);
                let value = extra.and_then(|r| parse_cell(r.get(*pos), name, line));
                observation.set(name.clone(), value);
            }
        }
    }

    Ok(TimeSeries::from_rows(primary)?)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use std::io::Write;
    use trend_calc::TrendError;

    const HEADER: &str =
        "date,granularite,maille_code,hospitalises,nouvelles_hospitalisations,deces,source_type";

    fn metrics() -> Vec<&'static str> {
        vec!["hospitalises", "nouvelles_hospitalisations", "deces"]
    }

    fn read(body: &str) -> Result<TimeSeries> {
        let csv = format!("{}\n{}", HEADER, body);
        read_time_series(csv.as_bytes(), &SourceConfig::default(), &metrics())
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
    }

    #[test]
    fn test_merges_primary_and_secondary() {
        let series = read(
            "2020-04-01,pays,FRA,100,,10,ministere-sante\n\
             2020-04-01,pays,FRA,,7,,opencovid19-fr\n\
             2020-04-02,pays,FRA,110,,12,ministere-sante\n\
             2020-04-02,pays,FRA,,9,,opencovid19-fr\n",
        )
        .unwrap();

        assert_eq!(series.dates(), &[day(1), day(2)]);
        assert_eq!(series.column("hospitalises").unwrap(), &[Some(100.0), Some(110.0)]);
        assert_eq!(
            series.column("nouvelles_hospitalisations").unwrap(),
            &[Some(7.0), Some(9.0)]
        );
        assert_eq!(series.column("deces").unwrap(), &[Some(10.0), Some(12.0)]);
    }

    #[test]
    fn test_filters_granularity_and_sources() {
        let series = read(
            "2020-04-01,departement,DEP-75,999,,999,ministere-sante\n\
             2020-04-01,pays,FRA,100,,10,ministere-sante\n\
             2020-04-01,pays,FRA,555,,555,sante-publique-france\n",
        )
        .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series.value("hospitalises", 0), Some(100.0));
    }

    #[test]
    fn test_missing_secondary_row_is_no_value() {
        let series = read("2020-04-01,pays,FRA,100,,10,ministere-sante\n").unwrap();
        assert!(series.has_column("nouvelles_hospitalisations"));
        assert_eq!(series.value("nouvelles_hospitalisations", 0), None);
    }

    #[test]
    fn test_unparsable_cell_is_no_value() {
        let series = read("2020-04-01,pays,FRA,n/a,,10,ministere-sante\n").unwrap();
        assert_eq!(series.value("hospitalises", 0), None);
        assert_eq!(series.value("deces", 0), Some(10.0));
    }

    #[test]
    fn test_duplicate_primary_date_is_invalid_input() {
        let err = read(
            "2020-04-01,pays,FRA,100,,10,ministere-sante\n\
             2020-04-01,pays,FRA,101,,11,ministere-sante\n",
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrendError>(),
            Some(TrendError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_date_is_error() {
        assert!(read("01/04/2020,pays,FRA,100,,10,ministere-sante\n").is_err());
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "date,hospitalises\n2020-04-01,3\n";
        assert!(read_time_series(csv.as_bytes(), &SourceConfig::default(), &metrics()).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "2020-04-01,pays,FRA,100,,10,ministere-sante").unwrap();

        let series = load_time_series(file.path(), &SourceConfig::default(), &metrics()).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_header_only_feed_fails_before_computation() {
        let series = read("").unwrap();
        assert!(series.is_empty());
        assert!(!series.has_column("hospitalises"));

        let err = trend_calc::TrendPipeline::reference()
            .run_for(&series, &["hospitalises"])
            .unwrap_err();
        assert!(matches!(err, TrendError::InvalidInput(_)));
    }

    #[test]
    fn test_non_ascii_delimiter_is_error() {
        let config = SourceConfig {
            delimiter: '→',
            ..SourceConfig::default()
        };
        let csv = format!("{}\n", HEADER);
        assert!(read_time_series(csv.as_bytes(), &config, &metrics()).is_err());
    }
}
