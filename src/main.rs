use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use rideclass::{
    read_rides, write_rides, AnalysisConfig, BatchSummary, LogConfig, LogFormat, LogLevel, Ride, RideAnalyzer,
    WorkoutType,
};

/// rideclass - Ride Segmentation and Workout Classification CLI
///
/// Finds climbs, descents and high-intensity intervals in recorded cycling
/// rides and labels each ride as intervals, endurance, race or rest.
#[derive(Parser)]
#[command(name = "rideclass")]
#[command(version)]
#[command(about = "Ride segmentation and workout classification", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log level, overriding -v (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Console log format (compact, pretty, json)
    #[arg(long, value_name = "FORMAT", default_value = "compact")]
    log_format: LogFormat,

    /// Also write JSON logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Append to the log file instead of rolling it over daily
    #[arg(long, requires = "log_file")]
    no_log_rotation: bool,

    /// Log span enter and close events
    #[arg(long)]
    log_spans: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment and classify rides read from a JSON file
    Classify {
        /// JSON file holding an array of rides
        #[arg(short, long)]
        file: PathBuf,

        /// Rider FTP in watts (rides stay unclassified without it)
        #[arg(long)]
        ftp: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write the analyzed rides as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or create the configuration file
    Config {
        /// Print the effective configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration to this path
        #[arg(short, long, value_name = "PATH")]
        init: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled)]
struct RideRow {
    #[tabled(rename = "Ride")]
    name: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Distance (km)")]
    distance_km: String,
    #[tabled(rename = "Avg W")]
    average_watts: String,
    #[tabled(rename = "Hills")]
    hills: usize,
    #[tabled(rename = "Intervals")]
    intervals: usize,
    #[tabled(rename = "Interval Time")]
    interval_time: String,
    #[tabled(rename = "Workout")]
    workout_type: WorkoutType,
}

impl From<&Ride> for RideRow {
    fn from(ride: &Ride) -> Self {
        Self {
            name: ride.name.clone(),
            date: ride
                .start_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
            distance_km: format!("{:.1}", ride.distance / 1000.0),
            average_watts: format!("{:.0}", ride.average_watts),
            hills: ride.hills.len(),
            intervals: ride.intervals.len(),
            interval_time: format_duration(ride.total_interval_time()),
            workout_type: ride.workout_type,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: cli.log_level.unwrap_or_else(|| LogLevel::from_verbosity(cli.verbose)),
        format: cli.log_format,
        file_path: cli.log_file.clone(),
        rotation: !cli.no_log_rotation,
        include_spans: cli.log_spans,
    };
    rideclass::logging::init_logging(&log_config).context("Failed to initialize logging")?;

    if cli.verbose > 0 {
        eprintln!("{}", format!("Log level: {:?}", log_config.level).dimmed());
    }

    let config = match &cli.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => AnalysisConfig::load_or_default()?,
    };

    match cli.command {
        Commands::Classify {
            file,
            ftp,
            format,
            output,
        } => classify(&config, &file, ftp, format, output.as_deref()),

        Commands::Config { show, init } => {
            if let Some(path) = init {
                AnalysisConfig::default().save_to_file(&path)?;
                println!(
                    "{}",
                    format!("✓ Default configuration written to {}", path.display()).green()
                );
            }
            if show {
                let text = toml::to_string_pretty(&config)
                    .context("Failed to serialize configuration to TOML")?;
                println!("{}", text);
            }
            Ok(())
        }
    }
}

fn classify(
    config: &AnalysisConfig,
    file: &Path,
    ftp: Option<f64>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let rides = read_rides(file).with_context(|| format!("Failed to load rides from {}", file.display()))?;

    if rides.is_empty() {
        println!("{}", "No rides found in input file".yellow());
        return Ok(());
    }

    let analyzer = RideAnalyzer::new(config);
    let progress = ProgressBar::new(rides.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} rides")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    let summary = analyzer.analyze_batch_with_progress(rides, ftp, || progress.inc(1));
    progress.finish_and_clear();

    if let Some(path) = output {
        write_rides(path, &summary.rides).with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("{}", format!("✓ Wrote {} rides to {}", summary.rides.len(), path.display()).green());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary.rides)?),
        OutputFormat::Table => print_summary(&summary),
    }

    if !summary.is_fully_successful() {
        for (name, reason) in &summary.failures {
            eprintln!("{} {}: {}", "✗".red(), name.bold(), reason);
        }
        anyhow::bail!(
            "{} of {} rides could not be analyzed",
            summary.failures.len(),
            summary.total()
        );
    }

    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    let rows: Vec<RideRow> = summary.rides.iter().map(RideRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    println!();
    for (workout_type, count) in summary.counts_by_type() {
        println!("  {:<10} {}", colorize(&workout_type), count);
    }
    println!(
        "{}",
        format!(
            "✓ Analyzed {} rides in {} ms",
            summary.rides.len(),
            summary.duration_ms
        )
        .green()
    );
}

fn colorize(workout_type: &str) -> ColoredString {
    match workout_type {
        "Intervals" => workout_type.red().bold(),
        "Race" => workout_type.magenta().bold(),
        "Endurance" => workout_type.blue().bold(),
        "Rest" => workout_type.green().bold(),
        _ => workout_type.dimmed(),
    }
}

fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
