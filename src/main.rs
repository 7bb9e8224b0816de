//! Bulletin-Harvest main entry point
//!
//! This is the command-line interface for the Bulletin-Harvest report harvester.

use anyhow::Context;
use bulletin_harvest::config::{load_config_with_hash, validate, Config};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Bulletin-Harvest: incremental harvester for exchange trading bulletins
///
/// Bulletin-Harvest walks the bulletin listing back to the start of the date
/// window, downloads reports not yet on disk, parses them and stores the
/// trading records the database does not hold yet.
#[derive(Parser, Debug)]
#[command(name = "bulletin-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Incremental harvester for exchange trading bulletins", long_about = None)]
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

    /// Override the window start date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    start_date: Option<NaiveDate>,

    /// Override the window end date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    end_date: Option<NaiveDate>,

    /// Validate config and show what would be harvested without harvesting
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Command-line dates take precedence over the file
    if cli.start_date.is_some() || cli.end_date.is_some() {
        if let Some(start_date) = cli.start_date {
            config.window.start_date = start_date;
        }
        if let Some(end_date) = cli.end_date {
            config.window.end_date = Some(end_date);
        }
        validate(&config).context("Invalid date window on the command line")?;
    }

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
            0 => EnvFilter::new("bulletin_harvest=info,warn"),
            1 => EnvFilter::new("bulletin_harvest=debug,info"),
            2 => EnvFilter::new("bulletin_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Bulletin-Harvest Dry Run ===\n");

    println!("Source:");
    println!("  Listing: {}", config.source.listing_url);
    println!("  Site: {}", config.source.site_url);
    println!("  Page query: {}", config.source.page_query);
    println!("  Link marker: {}", config.source.link_marker);
    println!("  Max pages: {}", config.source.max_pages);

    println!("\nWindow:");
    println!("  Start: {}", config.window.start_date);
    match config.window.end_date {
        Some(end_date) => println!("  End: {}", end_date),
        None => println!("  End: {} (today)", config.end_date()),
    }

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);
    println!(
        "  Max concurrent requests: {}",
        config.http.max_concurrent_requests
    );
    println!("  Extra headers: {}", config.http.headers.len());
    println!("  Cookies: {}", config.http.cookies.len());

    println!("\nDownload:");
    println!("  Directory: {}", config.download.directory);
    println!(
        "  Rate limit: {} per {}ms",
        config.download.rate_limit_quota, config.download.rate_limit_window_ms
    );

    println!("\nParse:");
    if config.parse.workers == 0 {
        println!("  Workers: one per CPU");
    } else {
        println!("  Workers: {}", config.parse.workers);
    }

    println!("\nImport:");
    println!("  Database: {}", config.import.database_path);
    println!("  Check chunk size: {}", config.import.check_chunk_size);
    println!("  Insert batch size: {}", config.import.insert_batch_size);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use bulletin_harvest::output::{load_statistics, print_statistics};
    use bulletin_harvest::storage::open_storage;
    use std::path::Path;

    println!("Database: {}\n", config.import.database_path);

    let storage = open_storage(Path::new(&config.import.database_path))
        .with_context(|| format!("Failed to open {}", config.import.database_path))?;

    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    use bulletin_harvest::output::print_summary;
    use bulletin_harvest::pipeline::harvest;

    tracing::info!(
        "Harvesting into {} (files in {})",
        config.import.database_path,
        config.download.directory
    );

    let summary = harvest(config).await.context("Harvest could not start")?;
    print_summary(&summary);

    Ok(())
}
