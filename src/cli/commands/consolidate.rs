//! The `consolidate` command: rebuild history from the batch archive

use super::shared::{create_spinner, setup_logging};
use crate::app::services::pipeline::{ConsolidationReport, consolidate};
use crate::app::services::storage::{BatchArchive, CsvHistoryStore, ParquetMirror};
use crate::cli::args::ConsolidateArgs;
use crate::constants::HISTORY_TIME_FORMAT;
use anyhow::{Context, Result};
use colored::*;
use tracing::info;

/// Rebuild the history table and print a summary
pub async fn run_consolidate(args: ConsolidateArgs) -> Result<()> {
    setup_logging(args.get_log_level(), args.quiet)?;
    info!(
        "Consolidating {} into {}",
        args.archive_dir.display(),
        args.history.display()
    );

    let archive = BatchArchive::new(&args.archive_dir);
    let history = CsvHistoryStore::new(&args.history);
    let parquet = args.parquet.as_ref().map(ParquetMirror::new);

    let spinner = create_spinner(
        &format!("Consolidating {}", args.archive_dir.display()),
        !args.quiet,
    );
    let archive_dir = args.archive_dir.display().to_string();
    let result =
        tokio::task::spawn_blocking(move || consolidate(&archive, &history, parquet.as_ref()))
            .await
            .context("Consolidation task panicked")?;
    spinner.finish_and_clear();

    let report = result.with_context(|| format!("Failed to consolidate {}", archive_dir))?;
    if !args.quiet {
        print_consolidation_summary(&report, &args);
    }
    Ok(())
}

fn print_consolidation_summary(report: &ConsolidationReport, args: &ConsolidateArgs) {
    println!(
        "{} {} rows from {} file(s)",
        "Consolidated".bright_green().bold(),
        report.total_rows.to_string().bright_white().bold(),
        report.files_read
    );
    println!(
        "  {} {} to {}",
        "Span:".bright_cyan(),
        report.first_capture.format(HISTORY_TIME_FORMAT),
        report.last_capture.format(HISTORY_TIME_FORMAT)
    );
    println!("  {} {}", "History:".bright_cyan(), args.history.display());
    if let Some(path) = &args.parquet {
        println!("  {} {}", "Parquet:".bright_cyan(), path.display());
    }
    if report.duplicates_dropped > 0 {
        println!(
            "  {} {}",
            "Duplicates dropped:".bright_yellow(),
            report.duplicates_dropped
        );
    }
    for (path, reason) in &report.files_skipped {
        println!("  {} {}: {}", "Skipped:".bright_yellow(), path.display(), reason);
    }
}
