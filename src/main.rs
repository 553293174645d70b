use clap::Parser;
use hottest_place::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    eprintln!("Failed to listen for CTRL+C: {}", e);
                }
                eprintln!("\nReceived CTRL+C, stopping...");
                Err(hottest_place::Error::interrupted("Interrupted by user").into())
            }
        }
    });

    if let Err(error) = result {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Hottest Place - live weather ranking tracker");
    println!("============================================");
    println!();
    println!("Fetches a live weather ranking page, records the current hottest place");
    println!("and appends every ranked location to a growing history table.");
    println!();
    println!("USAGE:");
    println!("    hottest-place <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    run            Run one scrape cycle");
    println!("    consolidate    Rebuild the history table from archived batches");
    println!("    help           Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Scrape once, writing consolidated_rankings.csv and data.json:");
    println!("    hottest-place run");
    println!();
    println!("    # Also keep a per-cycle archive and a Parquet mirror:");
    println!("    hottest-place run --archive-dir Data --parquet rankings.parquet");
    println!();
    println!("    # Replay a saved page:");
    println!("    hottest-place run --page-file saved.html -v");
    println!();
    println!("    # Rebuild history from the archive:");
    println!("    hottest-place consolidate --archive-dir Data");
    println!();
    println!("For detailed help on any command, use:");
    println!("    hottest-place <COMMAND> --help");
}
