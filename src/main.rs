//! Gleaner main entry point
//!
//! This is the command-line interface for the Gleaner job-listing harvester.

use anyhow::Result;
use clap::Parser;
use gleaner::config::load_config_with_hash;
use gleaner::crawler::Coordinator;
use gleaner::driver::build_factory;
use gleaner::output::{load_statistics, print_statistics, print_summary};
use gleaner::store::CatalogStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gleaner: a job-listing harvester
///
/// Gleaner walks a paginated listing site, discovers posting URLs, and
/// fetches each detail page with a bounded pool of concurrent workers,
/// persisting results incrementally so a crash loses no completed work.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version = "1.0.0")]
#[command(about = "A job-listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the catalog and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the harvest plan
fn handle_dry_run(config: &gleaner::config::Config) {
    println!("=== Gleaner Dry Run ===\n");

    println!("Search:");
    println!("  Mode: {:?}", config.search.mode);
    println!("  Query: {}", config.search.query);
    println!("  Base URL: {}", config.search.base_url);

    println!("\nHarvest:");
    println!("  Workers: {}", config.harvest.workers);
    if config.harvest.max_pages == 0 {
        println!("  Max pages: unbounded");
    } else {
        println!("  Max pages: {}", config.harvest.max_pages);
    }
    println!("  Retry attempts: {}", config.harvest.retry_attempts);

    println!("\nDriver:");
    println!("  Kind: {:?}", config.driver.kind);
    println!("  Endpoint: {}", config.driver.endpoint);

    println!("\nDelay:");
    println!("  Between requests: {}-{}ms", config.delay.min_ms, config.delay.max_ms);

    println!("\nOutput:");
    println!("  Catalog: {}", config.output.catalog_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the catalog
fn handle_stats(config: &gleaner::config::Config) -> Result<()> {
    println!("Catalog: {}\n", config.output.catalog_path);

    let store = CatalogStore::new(&config.output.catalog_path);
    store.initialize()?;

    let stats = load_statistics(&store);
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: gleaner::config::Config) -> Result<()> {
    tracing::info!(
        "Starting harvest: mode {:?}, {} workers",
        config.search.mode,
        config.harvest.workers
    );

    let factory = build_factory(&config.driver)?;
    let coordinator = Coordinator::new(config, factory);

    // Ctrl-C pauses the queue and lets in-flight work finish
    let stop = coordinator.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });

    match coordinator.run().await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
