//! Driftnet main entry point
//!
//! This is the command-line interface for the Driftnet crawler.

use clap::Parser;
use driftnet::config::load_config_with_hash;
use driftnet::crawler::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Driftnet: a distributed web archiving crawler
#[derive(Parser, Debug)]
#[command(name = "driftnet")]
#[command(version = "0.3.0")]
#[command(about = "A distributed web archiving crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
        return Ok(());
    }

    tracing::info!(
        "Starting crawl: {} workers, max hops {}, seeds {}",
        config.crawler.workers,
        config.crawler.max_hops,
        config.seeds.len()
    );

    match crawl(config).await {
        Ok(()) => {
            tracing::info!("Crawl finished");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("driftnet=info,warn"),
            1 => EnvFilter::new("driftnet=debug,info"),
            2 => EnvFilter::new("driftnet=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &driftnet::config::Config, config_hash: &str) {
    println!("=== Driftnet Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Max hops: {}", config.crawler.max_hops);
    println!("  Max redirects: {}", config.crawler.max_redirect);
    println!("  Asset seencheck: {}", config.crawler.asset_seencheck);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!(
        "  Proxy: {}",
        config.http.proxy.as_deref().unwrap_or("(none)")
    );
    if !config.http.bypass_proxy.is_empty() {
        println!("  Proxy bypass: {}", config.http.bypass_proxy.join(", "));
    }

    println!("\nSeencheck:");
    println!("  Database: {}", config.seencheck.database_path);

    match &config.kafka {
        Some(kafka) => {
            println!("\nKafka:");
            println!("  Brokers: {}", kafka.brokers.join(", "));
            println!("  Outlinks topic: {}", kafka.outlinks_topic);
            println!("  Feed topic: {}", kafka.feed_topic);
            println!("  Consumer group: {}", kafka.consumer_group);
        }
        None => println!("\nKafka: disabled (local queue only)"),
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\nConfig hash: {}", config_hash);
    println!("\n✓ Configuration is valid");
}
