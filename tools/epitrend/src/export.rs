//! CSV export of the trend report
//!
//! Two files, both one line per date:
//! - `summary.csv`: raw metric values then derived columns grouped by kind
//!   (`var`, `diff`, `avg`, `var_diff`), window, metric; proportions as stored
//! - `trend.csv`: output-ordered metric values then, per metric and window,
//!   `diff`, `var_diff` (percent), `trend_diff` (glyph) and `signal`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};
use trend_calc::{TrendFamily, TrendReport, Window};

pub const SUMMARY_FILE: &str = "summary.csv";
pub const TREND_FILE: &str = "trend.csv";

/// Files written by an export run
#[derive(Debug, Default)]
pub struct ExportResult {
    pub files_exported: Vec<PathBuf>,
    pub rows_exported: usize,
}

/// Derived column kinds in summary order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Var,
    Diff,
    Avg,
    VarDiff,
}

impl ColumnKind {
    const SUMMARY_ORDER: [ColumnKind; 4] = [
        ColumnKind::Var,
        ColumnKind::Diff,
        ColumnKind::Avg,
        ColumnKind::VarDiff,
    ];

    fn prefix(self) -> &'static str {
        match self {
            ColumnKind::Var => "var",
            ColumnKind::Diff => "diff",
            ColumnKind::Avg => "avg",
            ColumnKind::VarDiff => "var_diff",
        }
    }

    fn cell(self, family: &TrendFamily, row: usize) -> Option<f64> {
        let derived = family.derived();
        match self {
            ColumnKind::Var => derived.rel_change[row],
            ColumnKind::Diff => derived.diff[row],
            ColumnKind::Avg => derived.rolling_avg.as_ref().and_then(|avg| avg[row]),
            ColumnKind::VarDiff => derived.rel_change_of_diff[row],
        }
    }
}

/// `{prefix}_{metric}_{days}j`
pub fn column_name(prefix: &str, metric: &str, window: Window) -> String {
    format!("{}_{}_{}", prefix, metric, window)
}

/// Empty for no value; negative zero is written as `0`
fn format_cell(value: Option<f64>) -> String {
    value
        .map(|v| (if v == 0.0 { 0.0 } else { v }).to_string())
        .unwrap_or_default()
}

/// Report exporter
pub struct ReportExporter {
    delimiter: u8,
}

impl ReportExporter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Write both files into `output_dir`
    pub fn export(
        &self,
        report: &TrendReport,
        columns: &[String],
        output_dir: impl AsRef<Path>,
    ) -> Result<ExportResult> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir).context("Failed to create output directory")?;
        debug!("Exporting to directory: {:?}", output_dir);

        let mut result = ExportResult::default();

        let summary_path = output_dir.join(SUMMARY_FILE);
        self.write_summary(report, &summary_path)?;
        result.files_exported.push(summary_path);

        let trend_path = output_dir.join(TREND_FILE);
        self.write_trend(report, columns, &trend_path)?;
        result.files_exported.push(trend_path);

        result.rows_exported = report.len();
        info!(
            "Exported {} files with {} rows",
            result.files_exported.len(),
            result.rows_exported
        );
        Ok(result)
    }

    fn writer(&self, path: &Path) -> Result<csv::Writer<fs::File>> {
        csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))
    }

    /// Summary columns in export order, paired with their family and kind
    fn summary_columns<'a>(
        &self,
        report: &'a TrendReport,
    ) -> Vec<(String, &'a TrendFamily, ColumnKind)> {
        let windows: Vec<Window> = {
            let mut w: Vec<_> = report.families.iter().map(TrendFamily::window).collect();
            w.sort_unstable();
            w.dedup();
            w
        };

        let mut columns = Vec::new();
        for kind in ColumnKind::SUMMARY_ORDER {
            for &window in &windows {
                for metric in &report.metrics {
                    let Some(family) = report.family(&metric.spec.name, window) else {
                        continue;
                    };
                    if kind == ColumnKind::Avg && family.derived().rolling_avg.is_none() {
                        continue;
                    }
                    let name = column_name(kind.prefix(), &metric.spec.name, window);
                    columns.push((name, family, kind));
                }
            }
        }
        columns
    }

    pub fn write_summary(&self, report: &TrendReport, path: &Path) -> Result<()> {
        let mut writer = self.writer(path)?;
        let columns = self.summary_columns(report);

        let mut header = vec!["date".to_string()];
        header.extend(report.metrics.iter().map(|m| m.spec.name.clone()));
        header.extend(columns.iter().map(|(name, _, _)| name.clone()));
        writer.write_record(&header)?;

        for (row, date) in report.dates.iter().enumerate() {
            let mut record = vec![date.to_string()];
            record.extend(report.metrics.iter().map(|m| format_cell(m.values[row])));
            record.extend(
                columns
                    .iter()
                    .map(|(_, family, kind)| format_cell(kind.cell(family, row))),
            );
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_trend(&self, report: &TrendReport, columns: &[String], path: &Path) -> Result<()> {
        let mut writer = self.writer(path)?;

        let families: Vec<&TrendFamily> = columns
            .iter()
            .flat_map(|metric| report.families_for(metric))
            .collect();

        let mut header = vec!["date".to_string()];
        header.extend(columns.iter().cloned());
        for family in &families {
            let (metric, window) = (family.metric(), family.window());
            header.push(column_name("diff", metric, window));
            header.push(column_name("var_diff", metric, window));
            header.push(column_name("trend_diff", metric, window));
            header.push(column_name("signal", metric, window));
        }
        writer.write_record(&header)?;

        for (row, date) in report.dates.iter().enumerate() {
            let mut record = vec![date.to_string()];
            record.extend(columns.iter().map(|metric| {
                format_cell(report.metric(metric).and_then(|m| m.values[row]))
            }));
            for family in &families {
                record.push(format_cell(family.derived().diff[row]));
                record.push(format_cell(family.columns.rel_change_of_diff_pct[row]));
                record.push(family.columns.trend[row].glyph().to_string());
                record.push(family.signal[row].as_str().to_string());
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}
