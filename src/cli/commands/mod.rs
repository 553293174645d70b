//! Command implementations for the hottest place CLI
//!
//! Each command lives in its own module:
//! - `scrape`: one fetch/extract/persist cycle
//! - `consolidate`: rebuild the history table from archived batches

pub mod consolidate;
pub mod scrape;
pub mod shared;

use crate::cli::args::{Args, Commands};
use anyhow::Result;

/// Dispatch to the selected subcommand
pub async fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Commands::Run(run_args)) => scrape::run_scrape(run_args).await,
        Some(Commands::Consolidate(consolidate_args)) => {
            consolidate::run_consolidate(consolidate_args).await
        }
        None => Ok(()),
    }
}
