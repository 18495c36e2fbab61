//! Main entry point for the crop-sweep CLI

use clap::Parser;
use crop_sweep::config::SweepConfig;
use crop_sweep::driver::SweepDriver;
use crop_sweep::engine::ProcessEngine;
use crop_sweep::results::ShardCursor;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Batch scenario driver for crop-growth simulation sweeps.
#[derive(Debug, Parser)]
#[command(name = "crop-sweep", version, about)]
struct Cli {
    /// Outer shard index selecting the irradiation column
    #[arg(long, default_value_t = 0)]
    x1: usize,

    /// Outer shard index selecting the minimum-temperature column
    #[arg(long, default_value_t = 0)]
    x2: usize,

    /// Inner sweep resolution n (inner indices range over 0..=n)
    #[arg(long, default_value_t = 8)]
    resolution: usize,

    /// Directory holding the per-variable interval CSVs
    #[arg(long, default_value = "./interval_data")]
    data_dir: PathBuf,

    /// Path of the low-reference series CSV
    #[arg(long, default_value = "./prophet_low.csv")]
    low_series: PathBuf,

    /// Directory receiving checkpoint and cursor files
    #[arg(long, default_value = "./out")]
    output_dir: PathBuf,

    /// External simulator command invoked once per (crop, year, scenario)
    #[arg(long)]
    engine: PathBuf,

    /// Disable the progress bar
    #[arg(long, default_value_t = false)]
    no_progress: bool,
}

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crop_sweep=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SweepConfig::new(&cli.data_dir, &cli.low_series, &cli.output_dir)
        .with_resolution(cli.resolution);
    let engine = ProcessEngine::new(cli.engine.as_os_str());

    let mut driver = SweepDriver::new(config, engine);
    if !cli.no_progress {
        let bar = ProgressBar::new(driver.config().inner_tuple_count());
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tuples ({msg} rows)",
            )?
            .progress_chars("#>-"),
        );
        driver = driver.with_progress(move |p| {
            bar.set_position(p.completed_tuples);
            bar.set_message(p.rows.to_string());
        });
    }

    let accumulator = driver.run_shard(cli.x1, cli.x2)?;

    // The driver does not force a write for the final partial batch
    let checkpoint_path = driver.config().checkpoint_path(cli.x1, cli.x2);
    accumulator.save(&checkpoint_path)?;
    ShardCursor::new(
        cli.x1,
        cli.x2,
        cli.resolution,
        driver.config().inner_tuple_count(),
        accumulator.len() as u64,
    )
    .save(&ShardCursor::path_for(&checkpoint_path))?;

    info!(
        rows = accumulator.len(),
        path = %checkpoint_path.display(),
        "Shard results persisted"
    );
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("Sweep failed: {e:#}");
        std::process::exit(1);
    }
}
