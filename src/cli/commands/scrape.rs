//! The `run` command: one scrape cycle

use super::shared::{create_spinner, setup_logging};
use crate::app::services::fetcher::{FilePageSource, HttpPageSource, PageSource};
use crate::app::services::pipeline::{CycleOutcome, CycleReport, ScrapePipeline};
use crate::app::services::storage::{CsvHistoryStore, JsonSnapshotFile, build_sinks};
use crate::cli::args::RunArgs;
use crate::config::ScraperConfig;
use anyhow::{Context, Result};
use colored::*;
use indicatif::HumanDuration;
use tracing::{debug, info};

/// Run one cycle and print a summary
pub async fn run_scrape(args: RunArgs) -> Result<()> {
    setup_logging(args.get_log_level(), args.quiet)?;

    let config = args.to_config().context("Invalid run options")?;
    debug!("Configuration: {:?}", config);

    let report = match &args.page_file {
        Some(path) => execute(FilePageSource::new(path), &config, args.show_progress()).await,
        None => {
            let source = HttpPageSource::new(config.source.url.clone(), config.fetch.clone())
                .context("Failed to build HTTP client")?;
            execute(source, &config, args.show_progress()).await
        }
    }
    .context("Scrape cycle failed")?;

    if !args.quiet {
        print_cycle_summary(&report, &config);
    }
    Ok(())
}

async fn execute<S: PageSource>(
    source: S,
    config: &ScraperConfig,
    show_progress: bool,
) -> crate::Result<CycleReport> {
    info!("Starting scrape cycle from {}", source.describe());

    let spinner = create_spinner(&format!("Fetching {}", source.describe()), show_progress);
    let pipeline = ScrapePipeline::new(
        source,
        CsvHistoryStore::new(&config.output.history_path),
        JsonSnapshotFile::new(&config.output.snapshot_path),
        config,
    )
    .with_sinks(build_sinks(&config.output));

    let result = pipeline.run_once().await;
    spinner.finish_and_clear();
    result
}

fn print_cycle_summary(report: &CycleReport, config: &ScraperConfig) {
    match &report.outcome {
        CycleOutcome::Captured {
            snapshot,
            batch_size,
            rows_added,
            duplicates_dropped,
            total_rows,
            sinks,
        } => {
            println!(
                "{} {}, {} {}",
                "Hottest place:".bright_green().bold(),
                snapshot.city.bright_white().bold(),
                snapshot.country,
                format!("({})", snapshot.temperature).bright_red()
            );
            println!("  {} {}", "Condition:".bright_cyan(), snapshot.condition);
            println!("  {} {}", "Updated:".bright_cyan(), snapshot.last_updated);
            println!(
                "  {} {} ranked location(s), {} new row(s), {} duplicate(s)",
                "Batch:".bright_cyan(),
                batch_size.to_string().bright_white(),
                rows_added.to_string().bright_white(),
                duplicates_dropped
            );
            println!(
                "  {} {} ({} rows)",
                "History:".bright_cyan(),
                config.output.history_path.display(),
                total_rows.to_string().bright_white().bold()
            );
            println!(
                "  {} {}",
                "Snapshot:".bright_cyan(),
                config.output.snapshot_path.display()
            );
            for (name, reason) in &sinks.failed {
                println!("  {} {}: {}", "Sink failed:".bright_yellow(), name, reason);
            }
        }
        CycleOutcome::NoData { stage, reason } => {
            println!(
                "{} no ranking data this cycle ({} stage: {})",
                "Skipped:".bright_yellow().bold(),
                stage,
                reason
            );
        }
    }

    println!(
        "  {} {} attempt(s), {}",
        "Fetch:".bright_cyan(),
        report.fetch_attempts,
        HumanDuration(report.elapsed)
    );
}
