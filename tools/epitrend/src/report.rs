//! Terminal trend report
//!
//! Latest dates first. Each metric cell shows, per window, the trend glyph,
//! the relative change of the diff and the diff itself, coloured by signal.

use colored::*;
use trend_calc::{DerivedRow, QualSignal, TrendReport};

/// `+12` / `-3` / empty
pub fn signed(value: Option<f64>) -> String {
    match value {
        // also catches -0.0
        Some(v) if v >= 0.0 => format!("+{}", v.abs()),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

/// `+12.5%` / `-3%` / empty
pub fn signed_pct(value: Option<f64>) -> String {
    match value {
        Some(_) => format!("{}%", signed(value)),
        None => String::new(),
    }
}

fn paint(text: String, signal: QualSignal) -> ColoredString {
    match signal {
        QualSignal::Good => text.green(),
        QualSignal::Bad => text.red(),
        QualSignal::Unknown => text.normal(),
    }
}

/// Render the last `days` dates for `columns`
pub fn render(report: &TrendReport, columns: &[String], days: usize) -> String {
    let mut out = String::new();
    let width = columns.iter().map(String::len).max().unwrap_or(0);

    for row in (0..report.len()).rev().take(days) {
        out.push_str(&format!("{}\n", report.dates[row].to_string().bold()));

        for metric in columns {
            let value = report
                .metric(metric)
                .and_then(|m| m.values[row])
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!("  {:<width$} {:>10}", metric, value, width = width));

            for family in report.families_for(metric) {
                let signal = family.signal[row];
                let cell = format!(
                    "{} {} ({})",
                    family.columns.trend[row],
                    signed_pct(family.columns.rel_change_of_diff_pct[row]),
                    signed(family.derived().diff[row]),
                );
                out.push_str(&format!("  {}: {}", family.window(), paint(cell, signal)));
            }
            out.push('\n');
        }
    }
    out
}

/// Cells of the last `days` dates, oldest first
pub fn latest_rows(report: &TrendReport, days: usize) -> Vec<DerivedRow<'_>> {
    let cutoff = report.dates.get(report.len().saturating_sub(days)).copied();
    report
        .rows()
        .filter(|row| cutoff.is_some_and(|date| row.date >= date))
        .collect()
}
