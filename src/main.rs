mod analytics;
mod cli;
mod config;
mod ingest;
mod models;
mod scoring;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::analytics::collector::IngestStats;
use crate::analytics::reporter::Report;
use crate::cli::Cli;
use crate::config::settings::{LoggingConfig, Settings};
use crate::ingest::geo::CountryTable;
use crate::ingest::profile_builder::ProfileBuilder;
use crate::ingest::reader::read_log_file;
use crate::scoring::aggregator::RiskAggregator;
use crate::scoring::worker::score_profiles;

/// Initialise the `tracing` subscriber: human-readable stderr output plus an
/// optional JSON file. stdout is reserved for the report.
///
/// The returned guard flushes the file writer and must outlive `main`.
fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},logwarden={}", logging.level, logging.level)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let (file_layer, guard) = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file path has no file name: {}", file))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let started = Instant::now();

    // ---------------------------------------------------------------
    // 1. Configuration
    // ---------------------------------------------------------------
    let mut settings = match cli.config.as_deref() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    cli.apply_overrides(&mut settings);

    // ---------------------------------------------------------------
    // 2. Logging
    // ---------------------------------------------------------------
    let _log_guard = init_tracing(&settings.logging)?;

    info!("Starting logwarden");
    match cli.config.as_deref() {
        Some(path) => info!("Config loaded from {}", path),
        None => info!("No config file given; using built-in defaults"),
    }

    // ---------------------------------------------------------------
    // 3. Ingest
    // ---------------------------------------------------------------
    let countries = CountryTable::new(&settings.geo);
    if countries.is_empty() {
        info!("No country table configured; location signal treats every address as unresolved");
    }

    let mut builder = ProfileBuilder::new(&settings, countries);
    let mut ingest = IngestStats::default();
    for log in &cli.logs {
        let stats = read_log_file(log, &mut builder).await?;
        ingest.merge(&stats);
    }
    if builder.is_empty() {
        warn!("No parseable records found; the report will be empty");
    }
    info!(
        addresses = builder.len(),
        parsed = ingest.parsed,
        skipped = ingest.skipped,
        "Ingest complete"
    );

    let set = builder.finish();

    // ---------------------------------------------------------------
    // 4. Scoring
    // ---------------------------------------------------------------
    let aggregator = Arc::new(RiskAggregator::new(&settings));
    let prefix_counter = Arc::new(set.prefix_counter);
    let profiles = score_profiles(
        set.profiles,
        aggregator,
        prefix_counter,
        settings.ingest.workers,
    )
    .await?;

    // ---------------------------------------------------------------
    // 5. Report
    // ---------------------------------------------------------------
    let report = Report::build(&profiles, ingest, set.evaluated_at, &settings.report);
    match cli.output.as_deref() {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create report file: {}", path.display()))?;
            let mut out = BufWriter::new(file);
            report.write(&mut out, settings.report.format)?;
            out.flush().context("Failed to flush report file")?;
            info!("Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            report.write(&mut out, settings.report.format)?;
            out.flush().context("Failed to flush report")?;
        }
    }

    info!(
        profiles = report.profiles_total,
        flagged = report.profiles_flagged,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Done"
    );

    Ok(())
}
