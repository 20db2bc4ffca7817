//! epitrend - daily trend report for the national key figures
//!
//! Loads the key-figures CSV, derives diffs, relative changes and rolling
//! averages per metric and window, classifies the trends and writes the
//! summary and trend exports.

mod config;
mod export;
mod logging;
mod report;
mod source;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{debug, info};

use config::EpitrendConfig;
use export::ReportExporter;

#[derive(Parser)]
#[command(name = "epitrend")]
#[command(about = "Daily trend report for epidemiological key figures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to config/epitrend.yaml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute derived metrics and write summary.csv and trend.csv
    Compute {
        /// Key-figures CSV
        input: PathBuf,

        /// Output directory (overrides output.dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the latest trends to the terminal
    Report {
        /// Key-figures CSV
        input: PathBuf,

        /// Number of most recent days to show
        #[arg(short, long, default_value_t = 7)]
        days: usize,

        /// Restrict to these metrics (repeatable)
        #[arg(short, long)]
        metric: Vec<String>,

        /// Emit one JSON object per (date, metric, window) cell
        #[arg(long)]
        json: bool,
    },

    /// Check the configuration and, optionally, an input file
    Validate {
        /// Key-figures CSV to check against the metric table
        input: Option<PathBuf>,

        /// Print the effective configuration as YAML
        #[arg(long)]
        show: bool,
    },

    /// List the configured metrics
    Metrics,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = EpitrendConfig::load(cli.config.as_deref())?;
    let _guard = logging::init(&config.logging, cli.verbose)?;
    debug!("Configuration loaded: {:?}", config);

    match cli.command {
        Commands::Compute { input, output } => compute(&config, &input, output),
        Commands::Report {
            input,
            days,
            metric,
            json,
        } => print_report(&config, &input, days, metric, json),
        Commands::Validate { input, show } => validate(&config, input, show),
        Commands::Metrics => list_metrics(&config),
    }
}

fn compute(
    config: &EpitrendConfig,
    input: &std::path::Path,
    output: Option<PathBuf>,
) -> Result<()> {
    let pipeline = config.pipeline()?;
    let columns = config.output_columns(pipeline.registry())?;
    let names: Vec<&str> = pipeline.registry().names().collect();

    let series = source::load_time_series(input, &config.source, &names)?;
    let report = pipeline.run(&series)?;

    let output_dir = output.unwrap_or_else(|| config.output.dir.clone());
    let exporter = ReportExporter::new(config.output.delimiter_byte()?);
    let result = exporter.export(&report, &columns, &output_dir)?;

    println!("{}", "✓ Export complete".green().bold());
    for path in &result.files_exported {
        println!("  {}", path.display());
    }
    println!(
        "  {} dates, {} metrics, {} windows",
        result.rows_exported.to_string().cyan(),
        report.metrics.len().to_string().cyan(),
        pipeline.windows().len().to_string().cyan()
    );
    Ok(())
}

fn print_report(
    config: &EpitrendConfig,
    input: &std::path::Path,
    days: usize,
    metric: Vec<String>,
    json: bool,
) -> Result<()> {
    let pipeline = config.pipeline()?;
    let columns = if metric.is_empty() {
        config.output_columns(pipeline.registry())?
    } else {
        pipeline.validate_request(&metric)?;
        metric
    };

    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    let series = source::load_time_series(input, &config.source, &names)?;
    let report = pipeline.run_for(&series, &columns)?;

    if json {
        let rows = report::latest_rows(&report, days);
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", report::render(&report, &columns, days));
    }
    Ok(())
}

fn validate(config: &EpitrendConfig, input: Option<PathBuf>, show: bool) -> Result<()> {
    if show {
        print!("{}", serde_yaml::to_string(config)?);
    }

    let pipeline = config.pipeline()?;
    let columns = config.output_columns(pipeline.registry())?;
    println!(
        "{} {} metrics, windows {}",
        "✓ Configuration valid:".green(),
        pipeline.registry().len(),
        pipeline
            .windows()
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    if let Some(input) = input {
        let names: Vec<&str> = pipeline.registry().names().collect();
        let series = source::load_time_series(&input, &config.source, &names)?;
        let specs = pipeline.validate_request(&names)?;
        pipeline.validate_series(&series, &specs)?;
        info!(rows = series.len(), "Input validated");
        println!(
            "{} {} dates, {} output columns",
            "✓ Input valid:".green(),
            series.len(),
            columns.len()
        );
    }
    Ok(())
}

fn list_metrics(config: &EpitrendConfig) -> Result<()> {
    let registry = config.registry()?;
    let width = registry.names().map(str::len).max().unwrap_or(0);

    println!("{}", "Metrics".bold());
    for spec in registry.iter() {
        let mut flags = Vec::new();
        if spec.cumulative {
            flags.push("cumulative".yellow().to_string());
        }
        if spec.reverse_polarity {
            flags.push("reversed".magenta().to_string());
        }
        println!("  {:<width$}  {}", spec.name, flags.join(" "), width = width);
    }
    Ok(())
}
